//! OpenSearch discovery link.

use crate::{html, meta::PageMeta};

/// Site-relative path of the OpenSearch description document.
pub const OPENSEARCH_PATH: &str = "open-search.xml";

impl PageMeta<'_> {
    pub fn opensearch(&self) -> String {
        let site = self.site();
        let title = site.title();
        let href = site.url_to(OPENSEARCH_PATH);

        let tag = html::void_tag(
            "link",
            &[
                ("rel", Some("search")),
                ("type", Some("application/opensearchdescription+xml")),
                ("title", Some(&title)),
                ("href", Some(&href)),
            ],
        );
        html::lines(&[tag])
    }
}
