use crate::db::{Feedback, FeedbackStorage};
use crate::error::FolioError;

/// One page of the admin listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackPage {
    pub items: Vec<Feedback>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
    pub search: Option<String>,
}

impl FeedbackPage {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        i64::from(self.page) < self.total_pages
    }
}

#[derive(Clone)]
pub struct FeedbackService {
    storage: FeedbackStorage,
}

impl FeedbackService {
    pub fn new(storage: FeedbackStorage) -> Self {
        Self { storage }
    }

    /// Store a contact submission. All three fields are required after trimming.
    pub async fn submit(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<Feedback, FolioError> {
        let (name, email, message) = (name.trim(), email.trim(), message.trim());
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(FolioError::Validation("Please fill in all fields.".to_string()));
        }
        self.storage.insert(name, email, message).await
    }

    /// Newest-first page of records, optionally narrowed by `search`.
    /// Pages past the end come back empty.
    pub async fn list(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> Result<FeedbackPage, FolioError> {
        if page_size == 0 {
            return Err(FolioError::Validation("Page size must be at least 1.".to_string()));
        }
        let page = page.max(1);
        let search = normalize_search(search);
        let pattern = search.as_deref().map(like_pattern);

        let total = self.storage.count_matching(pattern.as_deref()).await?;
        let offset = i64::from(page - 1) * i64::from(page_size);
        let items = if offset < total {
            self.storage
                .page_matching(pattern.as_deref(), i64::from(page_size), offset)
                .await?
        } else {
            Vec::new()
        };

        Ok(FeedbackPage {
            items,
            page,
            page_size,
            total,
            total_pages: total_pages(total, page_size),
            search,
        })
    }

    /// Every record matching `search`, in listing order.
    pub async fn list_all(&self, search: Option<&str>) -> Result<Vec<Feedback>, FolioError> {
        let pattern = normalize_search(search).map(|s| like_pattern(&s));
        self.storage.all_matching(pattern.as_deref()).await
    }

    /// Returns `false` when no record had that id.
    pub async fn delete(&self, id: i64) -> Result<bool, FolioError> {
        Ok(self.storage.delete_by_id(id).await? > 0)
    }
}

pub fn total_pages(total: i64, page_size: u32) -> i64 {
    let size = i64::from(page_size.max(1));
    if total <= 0 { 0 } else { (total + size - 1) / size }
}

/// Trimmed search term, or `None` when nothing is left.
pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `%term%` with LIKE wildcards in the term escaped by `\`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(7, 1), 7);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jane"), "%jane%");
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn blank_search_is_no_search() {
        assert_eq!(normalize_search(None), None);
        assert_eq!(normalize_search(Some("   ")), None);
        assert_eq!(normalize_search(Some("  x@y ")), Some("x@y".to_string()));
    }

    #[test]
    fn page_navigation_flags() {
        let page = FeedbackPage {
            items: Vec::new(),
            page: 2,
            page_size: 5,
            total: 12,
            total_pages: 3,
            search: None,
        };
        assert!(page.has_prev());
        assert!(page.has_next());

        let last = FeedbackPage { page: 3, ..page };
        assert!(!last.has_next());
    }
}
