use crate::services::service_error::ServiceError;
use crate::shared::models::task::TaskDraft;

/// A submitted create or edit form.
///
/// Browsers send one `categoryIds` pair per checked box, which `serde_urlencoded`
/// cannot collect into a struct field, so the form is read from raw pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub id: Option<u64>,
    pub description: String,
    pub done: bool,
    pub priority_id: Option<u64>,
    pub category_ids: Vec<u64>,
}

impl TaskForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<TaskForm, ServiceError> {
        let mut form = TaskForm::default();
        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "id" => form.id = parse_optional_id("id", value)?,
                "description" => form.description = value.to_string(),
                "done" => form.done = matches!(value, "true" | "on" | "1"),
                "priorityId" => form.priority_id = parse_optional_id("priorityId", value)?,
                "categoryIds" | "categoryIds[]" => {
                    if let Some(id) = parse_optional_id("categoryIds", value)? {
                        if !form.category_ids.contains(&id) {
                            form.category_ids.push(id);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    pub fn draft(&self, user_id: u64) -> TaskDraft {
        TaskDraft {
            id: self.id,
            description: self.description.clone(),
            done: self.done,
            user_id: Some(user_id),
        }
    }
}

fn parse_optional_id(field: &str, value: &str) -> Result<Option<u64>, ServiceError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ServiceError::invalid(format!("{field} must be a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn collects_repeated_category_ids() {
        let form = TaskForm::from_pairs(pairs(&[
            ("description", " Buy milk "),
            ("priorityId", "2"),
            ("categoryIds", "1"),
            ("categoryIds[]", "3"),
            ("categoryIds", "1"),
        ]))
        .unwrap();

        assert_eq!(form.description, "Buy milk");
        assert_eq!(form.priority_id, Some(2));
        assert_eq!(form.category_ids, vec![1, 3]);
        assert!(!form.done);
        assert_eq!(form.id, None);
    }

    #[test]
    fn empty_selects_mean_none() {
        let form = TaskForm::from_pairs(pairs(&[("priorityId", ""), ("id", ""), ("done", "on")])).unwrap();
        assert_eq!(form.priority_id, None);
        assert!(form.category_ids.is_empty());
        assert!(form.done);
    }

    #[test]
    fn garbage_id_is_invalid() {
        let err = TaskForm::from_pairs(pairs(&[("categoryIds", "abc")])).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(ref m) if m.contains("abc")));
    }

    #[test]
    fn draft_carries_owner() {
        let form = TaskForm::from_pairs(pairs(&[("id", "4"), ("description", "x")])).unwrap();
        let draft = form.draft(9);
        assert_eq!(draft.id, Some(4));
        assert_eq!(draft.user_id, Some(9));
    }
}
