//! Required-skill lists per target role, used for ATS scoring and gap
//! detection. Intentionally conservative / illustrative.

pub const TARGET_ROLES: &[&str] = &[
    "Full Stack Developer",
    "Backend Developer",
    "Frontend Developer",
    "Data Scientist",
    "Machine Learning Engineer",
    "DevOps Engineer",
    "Cloud Engineer",
    "Software Engineer",
    "Mobile Developer",
    "QA Engineer",
];

const ROLE_SKILLS: &[(&str, &[&str])] = &[
    (
        "Full Stack Developer",
        &[
            "JavaScript",
            "TypeScript",
            "React",
            "Node.js",
            "HTML",
            "CSS",
            "SQL",
            "REST",
        ],
    ),
    (
        "Backend Developer",
        &["Node.js", "Python", "Django", "Flask", "SQL", "REST", "APIs"],
    ),
    (
        "Frontend Developer",
        &[
            "JavaScript",
            "TypeScript",
            "React",
            "Vue",
            "HTML",
            "CSS",
            "Accessibility",
        ],
    ),
    (
        "Data Scientist",
        &[
            "Python",
            "Pandas",
            "NumPy",
            "scikit-learn",
            "Statistics",
            "Machine Learning",
        ],
    ),
    (
        "Machine Learning Engineer",
        &["Python", "TensorFlow", "PyTorch", "ML", "Model Deployment"],
    ),
    (
        "DevOps Engineer",
        &[
            "Docker",
            "Kubernetes",
            "CI/CD",
            "Terraform",
            "AWS",
            "Monitoring",
        ],
    ),
    (
        "Cloud Engineer",
        &["AWS", "Azure", "GCP", "Cloud Architecture", "Terraform"],
    ),
    (
        "Software Engineer",
        &[
            "Algorithms",
            "Data Structures",
            "Testing",
            "Design Patterns",
            "Git",
        ],
    ),
    (
        "Mobile Developer",
        &["Android", "iOS", "React Native", "Swift", "Kotlin"],
    ),
    (
        "QA Engineer",
        &[
            "Testing",
            "Automation",
            "Selenium",
            "Cypress",
            "Test Planning",
        ],
    ),
];

/// Looks up the required skills for a role. `None` for unknown roles —
/// callers skip role scoring entirely rather than scoring against nothing.
pub fn required_skills_for(role: &str) -> Option<&'static [&'static str]> {
    ROLE_SKILLS
        .iter()
        .find(|(name, _)| *name == role)
        .map(|(_, skills)| *skills)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_target_role_has_skills() {
        for role in TARGET_ROLES {
            assert!(required_skills_for(role).is_some(), "missing skills for {role}");
        }
    }

    #[test]
    fn test_unknown_role_has_no_skills() {
        assert!(required_skills_for("Astronaut").is_none());
    }
}
