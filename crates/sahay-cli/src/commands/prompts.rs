//! Prompt library commands

use anyhow::{bail, Result};
use sahay_core::prompts::default_prompts_dir;
use sahay_core::{PromptId, PromptLibrary};

pub fn cmd_prompts_list() -> Result<()> {
    let library = PromptLibrary::new();

    println!("{:<25} {:>7}  {:<22}  {}", "ID", "VERSION", "TASK", "SOURCE");
    println!("{}", "-".repeat(70));

    for id in PromptId::all() {
        let prompt = library.get(*id)?;
        let source = if library.has_override(*id) {
            "✓ Custom"
        } else {
            "Default"
        };
        println!(
            "{:<25} {:>7}  {:<22}  {}",
            id.as_str(),
            prompt.metadata.version,
            prompt.metadata.task,
            source
        );
    }

    println!();
    println!(
        "Override directory: {}",
        default_prompts_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );
    Ok(())
}

pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let Some(id) = PromptId::all().iter().find(|id| id.as_str() == prompt_id) else {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        bail!(
            "Unknown prompt ID: {} (available: {})",
            prompt_id,
            known.join(", ")
        );
    };

    let prompt = PromptLibrary::new().get(*id)?;

    println!("Prompt:  {}", prompt.metadata.id);
    println!("Version: {}", prompt.metadata.version);
    println!("Task:    {}", prompt.metadata.task);
    match &prompt.override_path {
        Some(path) if prompt.is_override => println!("Source:  {}", path.display()),
        _ => println!("Source:  embedded default"),
    }
    println!();
    println!("{}", prompt.content);
    Ok(())
}

pub fn cmd_prompts_path() -> Result<()> {
    let Some(path) = default_prompts_dir() else {
        bail!("Could not determine the data directory on this system");
    };

    println!("{}", path.display());
    if !path.exists() {
        eprintln!("Note: this directory does not exist yet. Create it to add overrides.");
    }
    Ok(())
}
