// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! Detail-page field extraction.

use crate::config::{settle, Timings};
use crate::error::SessionError;
use crate::fields::{apply_overview, apply_promoter};
use crate::record::ProjectRecord;
use crate::session::{ClickMode, Query, Session, Target};
use crate::text::page_text;
use tracing::{debug, info, warn};

/// Tab or link that reveals the promoter section.
pub const PROMOTER_TAB_XPATH: &str =
    "//a[contains(text(),'Promoter') or contains(@href,'promoter')]";

/// Turns one detail page into a [`ProjectRecord`].
pub struct FieldExtractor<'a> {
    timings: &'a Timings,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(timings: &'a Timings) -> Self {
        Self { timings }
    }

    /// Extract every field from the detail page at `url`.
    ///
    /// Never fails. Fields that cannot be found stay empty and the record
    /// always carries `url`.
    pub async fn extract(&self, session: &mut dyn Session, url: &str) -> ProjectRecord {
        let mut record = ProjectRecord::new(url);

        let (html, text) = match self.load(session, url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "could not load detail page");
                return record;
            }
        };
        apply_overview(&mut record, &text, &html);

        let promoter_text = match self.reveal_promoter(session).await {
            Ok(Some(revealed)) => revealed,
            Ok(None) => {
                debug!(url = %url, "no promoter tab, using overview text");
                text
            }
            Err(e) => {
                debug!(url = %url, error = %e, "promoter tab failed, using overview text");
                text
            }
        };
        apply_promoter(&mut record, &promoter_text);

        info!(
            url = %url,
            resolved = record.resolved_fields(),
            "extracted project"
        );
        record
    }

    async fn load(
        &self,
        session: &mut dyn Session,
        url: &str,
    ) -> Result<(String, String), SessionError> {
        session.navigate(url).await?;
        settle(self.timings.detail_settle_ms).await;
        let html = session.page_source().await?;
        let text = page_text(&html);
        Ok((html, text))
    }

    /// Click the promoter tab and return the page text it reveals.
    ///
    /// `Ok(None)` when the page has no such tab.
    async fn reveal_promoter(
        &self,
        session: &mut dyn Session,
    ) -> Result<Option<String>, SessionError> {
        let query = Query::xpath(PROMOTER_TAB_XPATH);
        if session.query(&query).await?.is_empty() {
            return Ok(None);
        }
        session.click(&Target::new(query, 0), ClickMode::Script).await?;
        settle(self.timings.tab_settle_ms).await;
        let html = session.page_source().await?;
        Ok(Some(page_text(&html)))
    }
}
