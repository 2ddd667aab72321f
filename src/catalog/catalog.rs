use crate::manifest::{DetailField, ModelDescriptor, TaskKind};

use super::types::NotFoundError;

/// Searchable view over the reconciled model descriptors.
///
/// A catalog is built fresh on every refresh and never mutated afterwards,
/// so it can be shared freely between readers.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    descriptors: Vec<ModelDescriptor>,
}

impl ModelCatalog {
    pub fn new(descriptors: Vec<ModelDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Every descriptor, including those without a task kind.
    pub fn all(&self) -> &[ModelDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors with the given task kind, in load order.
    pub fn list_by_task(&self, kind: &TaskKind) -> Vec<&ModelDescriptor> {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.task.as_ref() == Some(kind))
            .collect()
    }

    /// Task view narrowed to names containing every term, ignoring case.
    pub fn search<S: AsRef<str>>(&self, kind: &TaskKind, terms: &[S]) -> Vec<&ModelDescriptor> {
        self.list_by_task(kind)
            .into_iter()
            .filter(|descriptor| matches_terms(&descriptor.name, terms))
            .collect()
    }

    /// [`search`](Self::search) with a free-text query split on whitespace.
    pub fn search_text(&self, kind: &TaskKind, query: &str) -> Vec<&ModelDescriptor> {
        let terms: Vec<&str> = query.split_whitespace().collect();
        self.search(kind, &terms)
    }

    pub fn exists_by_name(&self, name: &str) -> bool {
        self.descriptors.iter().any(|descriptor| descriptor.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&ModelDescriptor, NotFoundError> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.name == name)
            .ok_or_else(|| NotFoundError::new(name))
    }

    /// Metadata of one model in display order, skipping absent fields.
    pub fn get_detail_fields(&self, name: &str) -> Result<Vec<(DetailField, String)>, NotFoundError> {
        let descriptor = self.get(name)?;
        Ok(DetailField::ORDER
            .iter()
            .filter_map(|field| field.value(descriptor).map(|value| (*field, value)))
            .collect())
    }

    /// Brief description with trailing whitespace removed, empty if absent.
    pub fn tooltip(&self, name: &str) -> Result<String, NotFoundError> {
        let descriptor = self.get(name)?;
        Ok(descriptor
            .brief_description
            .as_deref()
            .map(str::trim_end)
            .unwrap_or_default()
            .to_string())
    }
}

/// True when the lowercase name contains every term; no terms always match.
pub fn matches_terms<S: AsRef<str>>(name: &str, terms: &[S]) -> bool {
    let name = name.to_lowercase();
    terms
        .iter()
        .all(|term| name.contains(&term.as_ref().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, task: Option<TaskKind>) -> ModelDescriptor {
        ModelDescriptor {
            name: name.to_string(),
            task,
            ..ModelDescriptor::default()
        }
    }

    fn catalog() -> ModelCatalog {
        ModelCatalog::new(vec![
            descriptor("MRI_GBM_Postop_FV_3p", Some(TaskKind::Segmentation)),
            descriptor("MRI_Meningioma", Some(TaskKind::Segmentation)),
            descriptor("Neuro_Diagnosis", Some(TaskKind::Diagnosis)),
            descriptor("Untyped", None),
            descriptor("MRI_GBM_Postop_FV_1p", Some(TaskKind::Segmentation)),
        ])
    }

    fn names<'a>(descriptors: &[&'a ModelDescriptor]) -> Vec<&'a str> {
        descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_list_by_task_keeps_load_order() {
        let catalog = catalog();
        assert_eq!(
            names(&catalog.list_by_task(&TaskKind::Segmentation)),
            vec!["MRI_GBM_Postop_FV_3p", "MRI_Meningioma", "MRI_GBM_Postop_FV_1p"]
        );
        assert_eq!(
            names(&catalog.list_by_task(&TaskKind::Diagnosis)),
            vec!["Neuro_Diagnosis"]
        );
        assert!(catalog.list_by_task(&TaskKind::parse("triage")).is_empty());
        assert_eq!(catalog.all().len(), 5);
    }

    #[test]
    fn test_search_requires_all_terms() {
        let catalog = catalog();
        let hits = catalog.search(&TaskKind::Segmentation, &["gbm", "post"]);
        assert_eq!(names(&hits), vec!["MRI_GBM_Postop_FV_3p", "MRI_GBM_Postop_FV_1p"]);

        let hits = catalog.search_text(&TaskKind::Segmentation, "GBM  3P");
        assert_eq!(names(&hits), vec!["MRI_GBM_Postop_FV_3p"]);

        let hits = catalog.search(&TaskKind::Segmentation, &["gbm", "meningioma"]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_search_without_terms_is_task_view() {
        let catalog = catalog();
        let empty: [&str; 0] = [];
        assert_eq!(
            names(&catalog.search(&TaskKind::Segmentation, &empty)),
            names(&catalog.list_by_task(&TaskKind::Segmentation))
        );
    }

    #[test]
    fn test_exists_by_name_is_case_sensitive() {
        let catalog = catalog();
        assert!(catalog.exists_by_name("MRI_Meningioma"));
        assert!(!catalog.exists_by_name("mri_meningioma"));
    }

    #[test]
    fn test_detail_fields_in_display_order() {
        let mut model = descriptor("Model", Some(TaskKind::Segmentation));
        model.brief_description = Some("Brief  \n".to_string());
        model.organ = Some("Brain".to_string());
        model.owner = Some("SINTEF".to_string());
        let catalog = ModelCatalog::new(vec![model]);

        let fields = catalog.get_detail_fields("Model").unwrap();
        assert_eq!(
            fields,
            vec![
                (DetailField::Owner, "SINTEF".to_string()),
                (DetailField::Task, "Segmentation".to_string()),
                (DetailField::Organ, "Brain".to_string()),
                (DetailField::BriefDescription, "Brief  \n".to_string()),
            ]
        );
        assert_eq!(catalog.tooltip("Model").unwrap(), "Brief");
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let catalog = catalog();
        assert_eq!(
            catalog.get_detail_fields("Missing").unwrap_err(),
            NotFoundError::new("Missing")
        );
        assert!(catalog.tooltip("Missing").is_err());
    }
}
