//! Scholarship eligibility and match scoring

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Scholarship, ScholarshipApplication, StudentProfile};

/// Matches below this score are not surfaced
pub const MATCH_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MATCH_LIMIT: usize = 20;

const INCOME_PENALTY: f64 = 0.3;
const CASTE_PENALTY: f64 = 0.2;
const GENDER_PENALTY: f64 = 0.1;
const COURSE_PENALTY: f64 = 0.2;
const STATE_PENALTY: f64 = 0.1;
const PERCENTAGE_PENALTY: f64 = 0.3;
const CGPA_PENALTY: f64 = 0.3;

/// Eligibility score and the criteria the student missed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    pub score: f64,
    pub unmet: Vec<String>,
}

/// A scholarship surfaced for a student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScholarshipMatch {
    pub scholarship_id: i64,
    pub name: String,
    pub provider: Option<String>,
    pub eligibility_score: f64,
    pub match_score: f64,
    pub reasons: Vec<String>,
    pub documents_required: Vec<String>,
    pub days_to_deadline: i64,
    /// Existing application status, or `not_applied`
    pub application_status: String,
}

fn contains_ignore_case(set: &[String], value: &str) -> bool {
    set.iter().any(|s| s.trim().eq_ignore_ascii_case(value.trim()))
}

/// Restriction set that is present and non-empty
fn restriction(set: &Option<Vec<String>>) -> Option<&[String]> {
    set.as_deref().filter(|s| !s.is_empty())
}

/// Start at 1.0 and deduct a fixed penalty per unmet criterion, floor 0
pub fn eligibility(student: &StudentProfile, scholarship: &Scholarship) -> Eligibility {
    let mut score = 1.0;
    let mut unmet = Vec::new();
    let mut miss = |penalty: f64, reason: &str| {
        score -= penalty;
        unmet.push(reason.to_string());
    };

    let income = student.family_annual_income;
    if let Some(min) = scholarship.min_income.filter(|m| *m > 0.0) {
        if income < min {
            miss(INCOME_PENALTY, "Income below minimum");
        }
    }
    if let Some(max) = scholarship.max_income.filter(|m| *m > 0.0) {
        if income > max {
            miss(INCOME_PENALTY, "Income above maximum");
        }
    }

    if let Some(castes) = restriction(&scholarship.eligible_castes) {
        if !contains_ignore_case(castes, student.caste_category.as_str()) {
            miss(CASTE_PENALTY, "Caste not eligible");
        }
    }
    if let Some(genders) = restriction(&scholarship.eligible_genders) {
        if !contains_ignore_case(genders, student.gender.as_str()) {
            miss(GENDER_PENALTY, "Gender not eligible");
        }
    }
    if let Some(courses) = restriction(&scholarship.eligible_courses) {
        if !contains_ignore_case(courses, &student.course) {
            miss(COURSE_PENALTY, "Course not eligible");
        }
    }
    if let Some(states) = restriction(&scholarship.eligible_states) {
        if !contains_ignore_case(states, &student.state) {
            miss(STATE_PENALTY, "State not eligible");
        }
    }

    // Unreported academics are not penalised
    if let (Some(required), Some(actual)) = (
        scholarship.min_percentage.filter(|p| *p > 0.0),
        student.known_percentage(),
    ) {
        if actual < required {
            miss(PERCENTAGE_PENALTY, "Percentage below requirement");
        }
    }
    if let (Some(required), Some(actual)) = (
        scholarship.min_cgpa.filter(|c| *c > 0.0),
        student.known_cgpa(),
    ) {
        if actual < required {
            miss(CGPA_PENALTY, "CGPA below requirement");
        }
    }

    Eligibility {
        score: score.clamp(0.0, 1.0),
        unmet,
    }
}

/// Award relative to family income, saturating at a tenth of income
pub fn financial_need(student: &StudentProfile, scholarship: &Scholarship) -> f64 {
    match scholarship.award_amount() {
        Some(amount) if student.family_annual_income > 0.0 => {
            (amount / student.family_annual_income * 10.0).min(1.0)
        }
        _ => 0.5,
    }
}

pub fn urgency(days_to_deadline: i64) -> f64 {
    match days_to_deadline {
        d if d <= 7 => 1.0,
        d if d <= 14 => 0.7,
        d if d <= 30 => 0.4,
        _ => 0.1,
    }
}

pub fn match_score(
    eligibility: f64,
    financial_need: f64,
    urgency: f64,
    popularity: f64,
) -> f64 {
    (eligibility * 0.6 + financial_need * 0.2 + urgency * 0.1 + popularity.clamp(0.0, 1.0) * 0.1)
        .min(1.0)
}

fn match_reasons(
    student: &StudentProfile,
    scholarship: &Scholarship,
    score: f64,
    days_left: i64,
) -> Vec<String> {
    let mut reasons = Vec::new();

    reasons.push(
        if score >= 0.8 {
            "Excellent match based on your profile"
        } else if score >= 0.6 {
            "Good match for your profile"
        } else {
            "Partial match - check eligibility criteria"
        }
        .to_string(),
    );

    if restriction(&scholarship.eligible_castes)
        .is_some_and(|c| contains_ignore_case(c, student.caste_category.as_str()))
    {
        reasons.push(format!(
            "Eligible for {} category",
            student.caste_category.as_str()
        ));
    }
    if restriction(&scholarship.eligible_states).is_some_and(|s| contains_ignore_case(s, &student.state)) {
        reasons.push(format!("Open to students from {}", student.state));
    }
    if restriction(&scholarship.eligible_courses)
        .is_some_and(|c| contains_ignore_case(c, &student.course))
    {
        reasons.push(format!("Available for {} students", student.course));
    }

    if days_left <= 7 {
        reasons.push(format!("Application closes in {} days!", days_left));
    } else if days_left <= 30 {
        reasons.push(format!("Apply soon - {} days remaining", days_left));
    }
    reasons
}

/// Ranks open scholarships for a student
pub struct ScholarshipMatcher {
    threshold: f64,
    limit: usize,
}

impl Default for ScholarshipMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ScholarshipMatcher {
    pub fn new() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
            limit: DEFAULT_MATCH_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Active scholarships still open on `today` scoring at least the
    /// threshold, best match first
    pub fn match_for(
        &self,
        student: &StudentProfile,
        scholarships: &[Scholarship],
        applications: &[ScholarshipApplication],
        today: NaiveDate,
    ) -> Vec<ScholarshipMatch> {
        let mut matches: Vec<ScholarshipMatch> = scholarships
            .iter()
            .filter(|s| s.is_open(today))
            .filter_map(|scholarship| {
                let days_left = (scholarship.application_end_date - today).num_days();
                let eligibility = eligibility(student, scholarship);
                let score = match_score(
                    eligibility.score,
                    financial_need(student, scholarship),
                    urgency(days_left),
                    scholarship.popularity_score,
                );

                if score < self.threshold {
                    debug!(
                        student_id = student.id,
                        scholarship_id = scholarship.id,
                        score,
                        unmet = ?eligibility.unmet,
                        "Scholarship below match threshold"
                    );
                    return None;
                }

                let application_status = applications
                    .iter()
                    .find(|a| a.student_id == student.id && a.scholarship_id == scholarship.id)
                    .map(|a| a.status.as_str().to_string())
                    .unwrap_or_else(|| "not_applied".to_string());

                Some(ScholarshipMatch {
                    scholarship_id: scholarship.id,
                    name: scholarship.name.clone(),
                    provider: scholarship.provider.clone(),
                    eligibility_score: eligibility.score,
                    match_score: score,
                    reasons: match_reasons(student, scholarship, score, days_left),
                    documents_required: scholarship.documents_required.clone(),
                    days_to_deadline: days_left,
                    application_status,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.match_score
                .total_cmp(&a.match_score)
                .then(a.days_to_deadline.cmp(&b.days_to_deadline))
        });
        matches.truncate(self.limit);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationStatus, ScholarshipStatus};
    use crate::test_utils::{scholarship, student};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn in_days(d: i64) -> NaiveDate {
        today() + chrono::Duration::days(d)
    }

    #[test]
    fn test_income_above_maximum_penalised() {
        let mut s = student();
        s.family_annual_income = 800_000.0;
        let mut sch = scholarship(1, in_days(60));
        sch.min_income = Some(0.0);
        sch.max_income = Some(500_000.0);

        let e = eligibility(&s, &sch);
        assert!(e.score < 1.0);
        assert!((e.score - 0.7).abs() < 1e-9);
        assert_eq!(e.unmet, vec!["Income above maximum".to_string()]);
    }

    #[test]
    fn test_unrestricted_scholarship_fully_eligible() {
        let e = eligibility(&student(), &scholarship(1, in_days(60)));
        assert_eq!(e.score, 1.0);
        assert!(e.unmet.is_empty());
    }

    #[test]
    fn test_penalties_accumulate_with_floor() {
        let mut s = student();
        s.current_cgpa = Some(5.0);
        s.last_semester_percentage = Some(50.0);
        let mut sch = scholarship(1, in_days(60));
        sch.min_income = Some(500_000.0);
        sch.eligible_castes = Some(vec!["sc".into(), "st".into()]);
        sch.eligible_genders = Some(vec!["male".into()]);
        sch.eligible_courses = Some(vec!["MBBS".into()]);
        sch.eligible_states = Some(vec!["Kerala".into()]);
        sch.min_cgpa = Some(8.0);
        sch.min_percentage = Some(85.0);

        let e = eligibility(&s, &sch);
        assert_eq!(e.score, 0.0);
        assert_eq!(e.unmet.len(), 7);
    }

    #[test]
    fn test_restrictions_match_case_insensitively() {
        let mut sch = scholarship(1, in_days(60));
        sch.eligible_states = Some(vec!["maharashtra".into()]);
        sch.eligible_genders = Some(vec!["FEMALE".into()]);
        sch.eligible_courses = Some(vec![]);
        assert_eq!(eligibility(&student(), &sch).score, 1.0);
    }

    #[test]
    fn test_unknown_academics_not_penalised() {
        let mut s = student();
        s.current_cgpa = None;
        s.last_semester_percentage = Some(0.0);
        let mut sch = scholarship(1, in_days(60));
        sch.min_cgpa = Some(9.0);
        sch.min_percentage = Some(90.0);
        assert_eq!(eligibility(&s, &sch).score, 1.0);
    }

    #[test]
    fn test_financial_need() {
        let s = student(); // income 360000
        let mut sch = scholarship(1, in_days(60));
        sch.amount = Some(18_000.0);
        assert!((financial_need(&s, &sch) - 0.5).abs() < 1e-9);
        sch.amount = Some(100_000.0);
        assert_eq!(financial_need(&s, &sch), 1.0);
        sch.amount = None;
        assert_eq!(financial_need(&s, &sch), 0.5);

        let mut broke = student();
        broke.family_annual_income = 0.0;
        sch.amount = Some(10_000.0);
        assert_eq!(financial_need(&broke, &sch), 0.5);
    }

    #[test]
    fn test_urgency_bands() {
        assert_eq!(urgency(0), 1.0);
        assert_eq!(urgency(7), 1.0);
        assert_eq!(urgency(8), 0.7);
        assert_eq!(urgency(14), 0.7);
        assert_eq!(urgency(30), 0.4);
        assert_eq!(urgency(31), 0.1);
    }

    #[test]
    fn test_match_for_skips_scholarships_not_yet_open() {
        let s = student();
        let mut upcoming = scholarship(1, in_days(40));
        upcoming.application_start_date = Some(in_days(10));
        let mut opens_today = scholarship(2, in_days(40));
        opens_today.application_start_date = Some(today());

        let matches =
            ScholarshipMatcher::new().match_for(&s, &[upcoming, opens_today], &[], today());
        let ids: Vec<i64> = matches.iter().map(|m| m.scholarship_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_match_for_ranks_filters_and_tags() {
        let s = student();
        let soon = scholarship(1, in_days(5));
        let later = scholarship(2, in_days(60));
        let mut excluded = scholarship(3, in_days(10));
        excluded.eligible_states = Some(vec!["Kerala".into()]);
        excluded.eligible_courses = Some(vec!["MBBS".into()]);
        excluded.eligible_castes = Some(vec!["st".into()]);
        excluded.min_cgpa = Some(9.0);
        let mut closed = scholarship(4, in_days(5));
        closed.status = ScholarshipStatus::Closed;
        let expired = scholarship(5, in_days(-1));

        let applications = vec![ScholarshipApplication {
            id: 1,
            student_id: 1,
            scholarship_id: 2,
            status: ApplicationStatus::Submitted,
        }];

        let matches = ScholarshipMatcher::new().match_for(
            &s,
            &[later, soon, excluded, closed, expired],
            &applications,
            today(),
        );

        let ids: Vec<i64> = matches.iter().map(|m| m.scholarship_id).collect();
        assert_eq!(ids, vec![1, 2]);

        let first = &matches[0];
        // 0.6 + 1.0*0.2 + 1.0*0.1 + 0.5*0.1
        assert!((first.match_score - 0.95).abs() < 1e-9);
        assert_eq!(first.reasons[0], "Excellent match based on your profile");
        assert!(first
            .reasons
            .contains(&"Application closes in 5 days!".to_string()));
        assert_eq!(first.application_status, "not_applied");
        assert_eq!(first.documents_required, vec!["Income certificate".to_string()]);

        assert_eq!(matches[1].application_status, "submitted");
        assert_eq!(matches[1].days_to_deadline, 60);
    }

    #[test]
    fn test_specific_reasons() {
        let mut sch = scholarship(1, in_days(20));
        sch.eligible_states = Some(vec!["Maharashtra".into()]);
        sch.eligible_castes = Some(vec!["general".into(), "obc".into()]);
        sch.eligible_courses = Some(vec!["B.Tech Computer Science".into()]);

        let matches = ScholarshipMatcher::new().match_for(&student(), &[sch], &[], today());
        let reasons = &matches[0].reasons;
        assert!(reasons.contains(&"Eligible for general category".to_string()));
        assert!(reasons.contains(&"Open to students from Maharashtra".to_string()));
        assert!(reasons.contains(&"Available for B.Tech Computer Science students".to_string()));
        assert!(reasons.contains(&"Apply soon - 20 days remaining".to_string()));
    }

    #[test]
    fn test_limit() {
        let list: Vec<Scholarship> = (1..=30).map(|i| scholarship(i, in_days(40))).collect();
        assert_eq!(
            ScholarshipMatcher::new().match_for(&student(), &list, &[], today()).len(),
            20
        );
        assert_eq!(
            ScholarshipMatcher::new()
                .with_limit(3)
                .match_for(&student(), &list, &[], today())
                .len(),
            3
        );
    }
}
