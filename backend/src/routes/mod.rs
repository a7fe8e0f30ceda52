pub mod curriculum;
pub mod drafts;
pub mod generation;
pub mod occurrences;
pub mod templates;

#[cfg(test)]
mod tests {
    #[test]
    fn test_module_structure() {
        // Test that all route module constants are accessible
        assert_eq!(
            super::curriculum::DISTRIBUTE_PLANNED_DATES,
            "distribute_planned_dates"
        );
        assert_eq!(super::drafts::VALIDATE_DRAFT, "validate_draft");
        assert_eq!(super::generation::GENERATE_CALENDAR, "generate_calendar");
        assert_eq!(super::occurrences::LIST_OCCURRENCES, "list_occurrences");
        assert_eq!(
            super::occurrences::ADD_MANUAL_OCCURRENCE,
            "add_manual_occurrence"
        );
        assert_eq!(super::occurrences::MARK_CONDUCTED, "mark_conducted");
        assert_eq!(super::templates::LIST_TEMPLATES, "list_templates");
        assert_eq!(super::templates::GET_ACTIVE_TEMPLATE, "get_active_template");
        assert_eq!(super::templates::PUBLISH_DRAFT, "publish_draft");
    }
}
