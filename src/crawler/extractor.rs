//! Response extraction for segmentation pages
//!
//! The endpoint wraps its payload in a `pageProps` envelope containing a
//! `companies` array and a `pagination.next` hint. Numeric fields arrive
//! as either numbers or strings depending on the build, so the lenient
//! serde-aux deserializers are used for all of them.

use crate::filter::CategoryFilter;
use crate::storage::CompanyRecord;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_option_number_from_string;

/// Top-level response envelope
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    #[serde(default)]
    pub page_props: PageProps,
}

/// The `pageProps` payload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProps {
    #[serde(default)]
    pub companies: Vec<RawCompany>,

    #[serde(default)]
    pub pagination: Pagination,
}

/// Pagination metadata; `next` is an untrusted hint validated by the frontier
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub next: Option<u32>,
}

/// One company entry as the endpoint serves it
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCompany {
    #[serde(default)]
    pub company_id: Option<String>,

    #[serde(default)]
    pub organisation_number: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub home_page: Option<String>,

    #[serde(default)]
    pub nace_categories: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub revenue: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub profit: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub foundation_year: Option<i64>,
}

/// The usable content of one fetched page
#[derive(Debug)]
pub struct ExtractedPage {
    /// Companies that passed the category filter
    pub companies: Vec<CompanyRecord>,

    /// The endpoint's next-page hint, if any
    pub next_page: Option<u32>,

    /// Number of companies on the page before filtering
    ///
    /// The consecutive-empty stop condition counts raw companies, so a page
    /// whose entries were all filtered out does not look empty.
    pub raw_count: usize,
}

/// Converts a response envelope into filtered company records
///
/// The identifier falls back from `companyId` to `organisationNumber`;
/// entries carrying neither are skipped with a warning.
pub fn extract_page(envelope: PageEnvelope, filter: &CategoryFilter) -> ExtractedPage {
    let raw_count = envelope.page_props.companies.len();
    let next_page = envelope.page_props.pagination.next;

    let mut companies = Vec::with_capacity(raw_count);
    for raw in envelope.page_props.companies {
        let company_id = match raw.company_id.or(raw.organisation_number) {
            Some(id) if !id.is_empty() => id,
            _ => {
                tracing::warn!(name = raw.name.as_deref(), "skipping company without identifier");
                continue;
            }
        };

        let categories = raw.nace_categories.unwrap_or_default();

        if !filter.keeps(&categories) {
            tracing::debug!(company_id = %company_id, "dropped by category filter");
            continue;
        }

        companies.push(CompanyRecord {
            company_id,
            name: raw.name,
            homepage: raw.home_page,
            categories,
            revenue: raw.revenue,
            profit: raw.profit,
            foundation_year: raw.foundation_year,
        });
    }

    ExtractedPage {
        companies,
        next_page,
        raw_count,
    }
}
