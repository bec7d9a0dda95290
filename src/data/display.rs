//! Human-readable feature labels used at presentation time only

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("anxiety_level", "Anxiety Level"),
    ("self_esteem", "Self-Esteem"),
    ("mental_health_history", "Mental Health History"),
    ("depression", "Depression"),
    ("headache", "Headaches"),
    ("blood_pressure", "Blood Pressure"),
    ("sleep_quality", "Sleep Quality"),
    ("breathing_problem", "Breathing Problems"),
    ("noise_level", "Environmental Noise"),
    ("living_conditions", "Living Conditions"),
    ("safety", "Safety"),
    ("basic_needs", "Basic Needs Met"),
    ("academic_performance", "Academic Performance"),
    ("study_load", "Study Load"),
    ("teacher_student_relationship", "Teacher-Student Relationship"),
    ("future_career_concerns", "Future Career Concerns"),
    ("social_support", "Social Support"),
    ("peer_pressure", "Peer Pressure"),
    ("extracurricular_activities", "Extracurricular Activities"),
    ("bullying", "Bullying"),
    ("stress_level", "Stress Level"),
];

/// Display label for a feature identifier; unknown identifiers pass through.
pub fn display_name(feature: &str) -> String {
    DISPLAY_NAMES
        .iter()
        .find(|(id, _)| *id == feature)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| feature.to_string())
}

pub fn display_names<S: AsRef<str>>(features: &[S]) -> Vec<String> {
    features.iter().map(|f| display_name(f.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_names() {
        assert_eq!(display_name("anxiety_level"), "Anxiety Level");
        assert_eq!(display_name("shoe_size"), "shoe_size");
        assert_eq!(
            display_names(&["bullying", "x"]),
            vec!["Bullying".to_string(), "x".to_string()]
        );
    }
}
