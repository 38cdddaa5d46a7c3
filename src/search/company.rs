//! Company resolution with a keyword-search fallback.

use tracing::{debug, info};

use crate::client::{ApiResponse, Transport};
use crate::error::{Result, ScrapeError};
use crate::fetchers::VOYAGER_API;
use crate::json;
use crate::models::{company_slug_from_url, Company};

/// Header the company search endpoint requires.
const PEGASUS_HEADER: (&str, &str) = ("x-li-graphql-pegasus-client", "true");

pub fn company_url(universal_name: &str) -> String {
    format!(
        "{}/organization/companies?q=universalName&universalName={}",
        VOYAGER_API,
        urlencoding::encode(universal_name)
    )
}

pub fn company_search_url(keywords: &str) -> String {
    let keywords = urlencoding::encode(keywords);
    format!(
        "{}/graphql?queryId=voyagerSearchDashClusters.02af3bc8bc85a169bb76bb4805d05759&queryName=SearchClusterCollection&variables=(query:(flagshipSearchIntent:SEARCH_SRP,keywords:{k},includeFiltersInResponse:false,queryParameters:(keywords:List({k}),resultType:List(COMPANIES))),count:10,origin:GLOBAL_SEARCH_HEADER,start:0)",
        VOYAGER_API,
        k = keywords
    )
}

/// Look a company up by universal name. A 404 triggers one keyword
/// search, and the top result's universal name is looked up instead.
pub async fn resolve_company(transport: &dyn Transport, name: &str) -> Result<Company> {
    let mut response = transport.get(&company_url(name), &[]).await?;
    debug!("Fetched company {} -> {}", name, response.status);

    if response.status == 404 {
        info!(
            "Failed to directly use company '{}' as company id, now searching for the company",
            name
        );
        let slug = search_company(transport, name).await?;
        response = transport.get(&company_url(&slug), &[]).await?;
        if response.status == 404 {
            return Err(ScrapeError::CompanyNotFound(format!(
                "{} (searched as '{}')",
                name, slug
            )));
        }
    }

    let company = parse_company_response(&response, name)?;
    info!(
        "Found company '{}' with {} staff",
        company.universal_name.as_deref().unwrap_or(name),
        company.staff_count.unwrap_or_default()
    );
    Ok(company)
}

fn parse_company_response(response: &ApiResponse, name: &str) -> Result<Company> {
    check_status(response, name)?;
    let body = response.json()?;
    let element = json::path(&body, "elements.0")
        .ok_or_else(|| ScrapeError::CompanyNotFound(name.to_string()))?;

    let company = Company::from_element(element, name);
    if company.id.is_none() {
        return Err(ScrapeError::UnexpectedResponse(format!(
            "company '{}' has no tracking urn",
            name
        )));
    }
    Ok(company)
}

/// Keyword search; returns the universal name of the top company hit.
pub async fn search_company(transport: &dyn Transport, name: &str) -> Result<String> {
    let response = transport
        .get(&company_search_url(name), &[PEGASUS_HEADER])
        .await?;
    debug!("Searched companies {}", response.status);
    check_status(&response, name)?;

    let body = response.json()?;
    let hit = json::array_at(&body, "data.searchDashClustersByAll.elements")
        .iter()
        .flat_map(|cluster| json::array_at(cluster, "items"))
        .filter_map(|item| json::path(item, "item.entityResult"))
        .find_map(|entity| {
            let slug = json::str_at(entity, "navigationUrl").and_then(company_slug_from_url)?;
            Some((slug, json::string_at(entity, "title.text")))
        });

    match hit {
        Some((slug, title)) => {
            info!(
                "Searched company {} and found company id '{}' with company name '{}'",
                name,
                slug,
                title.unwrap_or_default()
            );
            Ok(slug)
        }
        None => Err(ScrapeError::CompanyNotFound(name.to_string())),
    }
}

fn check_status(response: &ApiResponse, name: &str) -> Result<()> {
    match response.status {
        200..=299 => Ok(()),
        429 => Err(ScrapeError::RateLimited),
        404 => Err(ScrapeError::CompanyNotFound(name.to_string())),
        status => Err(ScrapeError::UnexpectedResponse(format!(
            "failed to find company {}: HTTP {} {}",
            name,
            status,
            response.snippet()
        ))),
    }
}
