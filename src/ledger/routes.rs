use crate::constants::network::API_VERSION_PREFIX;
use crate::constants::protocols::ALLOWED_HTTP;
use crate::errors::ToolError;
use crate::ledger::types::{BackendService, Operation, OperationParams, ResourceKind};
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Base URLs of the two backend services. Immutable once built.
#[derive(Debug, Clone)]
pub struct BackendRoutes {
    onboarding: Url,
    transaction: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub url: String,
    pub service: BackendService,
}

impl BackendRoutes {
    pub fn new(onboarding: &str, transaction: &str) -> Result<Self, ToolError> {
        Ok(Self {
            onboarding: parse_http_url(onboarding, "onboarding service URL")?,
            transaction: parse_http_url(transaction, "transaction service URL")?,
        })
    }

    pub fn base_url(&self, service: BackendService) -> &Url {
        match service {
            BackendService::Onboarding => &self.onboarding,
            BackendService::Transaction => &self.transaction,
        }
    }

    /// Same inputs always produce the same endpoint; test-mode previews rely on it.
    pub fn resolve(
        &self,
        operation: Operation,
        resource: ResourceKind,
        params: &OperationParams,
    ) -> Result<Endpoint, ToolError> {
        let service = resource.service();
        let base = self.base_url(service).as_str().trim_end_matches('/');
        let path = build_path(operation, resource, params);
        let mut url = Url::parse(&format!("{}{}{}", base, API_VERSION_PREFIX, path))
            .map_err(|err| ToolError::internal(format!("Failed to build endpoint URL: {}", err)))?;

        if operation == Operation::List {
            let pairs = list_query_pairs(params);
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        Ok(Endpoint {
            method: operation.method(),
            url: url.to_string(),
            service,
        })
    }
}

/// Parses a backend URL and rejects anything but http(s). `label` names the
/// setting in error messages.
pub fn parse_http_url(raw: &str, label: &str) -> Result<Url, ToolError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|_| ToolError::invalid_params(format!("Invalid {}: {}", label, raw)))?;
    let scheme_ok = ALLOWED_HTTP
        .iter()
        .any(|allowed| allowed.trim_end_matches(':') == parsed.scheme());
    if !scheme_ok {
        return Err(ToolError::invalid_params(format!(
            "{} must use http or https",
            label
        )));
    }
    Ok(parsed)
}

fn build_path(operation: Operation, resource: ResourceKind, params: &OperationParams) -> String {
    let hierarchy = &params.hierarchy;
    let mut path = String::new();

    if resource.requires_organization() {
        if let Some(org) = &hierarchy.organization_id {
            path.push_str("/organizations/");
            path.push_str(org);
        }
    }
    if !matches!(resource, ResourceKind::Organizations | ResourceKind::Ledgers) {
        if let Some(ledger) = &hierarchy.ledger_id {
            path.push_str("/ledgers/");
            path.push_str(ledger);
        }
    }
    if resource.requires_account() {
        if let Some(account) = &hierarchy.account_id {
            path.push_str("/accounts/");
            path.push_str(account);
        }
    }

    path.push('/');
    path.push_str(resource.as_str());

    if operation.requires_id() {
        if let Some(id) = &params.id {
            path.push('/');
            path.push_str(id);
        }
    }
    path
}

fn list_query_pairs(params: &OperationParams) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(filters) = &params.filters {
        for (key, value) in filters {
            let rendered = match value {
                Value::Null => continue,
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            pairs.push((key.clone(), rendered));
        }
    }
    if let Some(pagination) = &params.pagination {
        if let Some(limit) = &pagination.limit {
            let rendered = pagination
                .whole_limit()
                .map(|whole| whole.to_string())
                .unwrap_or_else(|| limit.to_string());
            pairs.push(("limit".to_string(), rendered));
        }
        if let Some(cursor) = pagination.cursor.as_deref().map(str::trim) {
            if !cursor.is_empty() {
                pairs.push(("cursor".to_string(), cursor.to_string()));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{Pagination, ResourceHierarchy};
    use std::collections::BTreeMap;

    fn routes() -> BackendRoutes {
        BackendRoutes::new("http://onboarding.local:3000/", "http://transaction.local:3001")
            .expect("routes")
    }

    fn scoped(org: &str, ledger: Option<&str>, account: Option<&str>) -> OperationParams {
        OperationParams {
            hierarchy: ResourceHierarchy {
                organization_id: Some(org.to_string()),
                ledger_id: ledger.map(str::to_string),
                account_id: account.map(str::to_string),
            },
            ..Default::default()
        }
    }

    #[test]
    fn organizations_have_no_prefix() {
        let mut params = OperationParams::default();
        params.id = Some("org1".to_string());
        let endpoint = routes()
            .resolve(Operation::Get, ResourceKind::Organizations, &params)
            .expect("endpoint");
        assert_eq!(endpoint.url, "http://onboarding.local:3000/v1/organizations/org1");
        assert_eq!(endpoint.method, Method::GET);
        assert_eq!(endpoint.service, BackendService::Onboarding);
    }

    #[test]
    fn accounts_nest_under_ledger() {
        let mut params = scoped("o1", Some("l1"), None);
        params.id = Some("a1".to_string());
        let endpoint = routes()
            .resolve(Operation::Update, ResourceKind::Accounts, &params)
            .expect("endpoint");
        assert_eq!(
            endpoint.url,
            "http://onboarding.local:3000/v1/organizations/o1/ledgers/l1/accounts/a1"
        );
        assert_eq!(endpoint.method, Method::PATCH);
    }

    #[test]
    fn balances_route_to_transaction_service_under_account() {
        let params = scoped("o1", Some("l1"), Some("a1"));
        let endpoint = routes()
            .resolve(Operation::List, ResourceKind::Balances, &params)
            .expect("endpoint");
        assert_eq!(
            endpoint.url,
            "http://transaction.local:3001/v1/organizations/o1/ledgers/l1/accounts/a1/balances"
        );
        assert_eq!(endpoint.service, BackendService::Transaction);
    }

    #[test]
    fn account_segment_is_skipped_for_ledger_level_resources() {
        let params = scoped("o1", Some("l1"), Some("a1"));
        let endpoint = routes()
            .resolve(Operation::List, ResourceKind::Transactions, &params)
            .expect("endpoint");
        assert_eq!(
            endpoint.url,
            "http://transaction.local:3001/v1/organizations/o1/ledgers/l1/transactions"
        );
    }

    #[test]
    fn list_appends_encoded_filters_and_pagination() {
        let mut params = scoped("o1", Some("l1"), None);
        let mut filters = BTreeMap::new();
        filters.insert("status".to_string(), Value::String("ACTIVE & open".to_string()));
        filters.insert("alias".to_string(), Value::String("@user/1".to_string()));
        filters.insert("deleted".to_string(), Value::Bool(false));
        filters.insert("ignored".to_string(), Value::Null);
        params.filters = Some(filters);
        params.pagination = Some(Pagination {
            limit: serde_json::Number::from_f64(25.0),
            cursor: Some("abc=".to_string()),
        });
        let endpoint = routes()
            .resolve(Operation::List, ResourceKind::Accounts, &params)
            .expect("endpoint");
        assert_eq!(
            endpoint.url,
            "http://onboarding.local:3000/v1/organizations/o1/ledgers/l1/accounts?alias=%40user%2F1&deleted=false&status=ACTIVE+%26+open&limit=25&cursor=abc%3D"
        );
    }

    #[test]
    fn filters_are_ignored_outside_list() {
        let mut params = scoped("o1", None, None);
        params.id = Some("l1".to_string());
        let mut filters = BTreeMap::new();
        filters.insert("status".to_string(), Value::String("x".to_string()));
        params.filters = Some(filters);
        let endpoint = routes()
            .resolve(Operation::Delete, ResourceKind::Ledgers, &params)
            .expect("endpoint");
        assert_eq!(
            endpoint.url,
            "http://onboarding.local:3000/v1/organizations/o1/ledgers/l1"
        );
        assert_eq!(endpoint.method, Method::DELETE);
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut params = scoped("o1", Some("l1"), None);
        params.data = Some(serde_json::json!({"name": "x"}));
        let a = routes().resolve(Operation::Create, ResourceKind::Portfolios, &params);
        let b = routes().resolve(Operation::Create, ResourceKind::Portfolios, &params);
        assert_eq!(a.expect("a"), b.expect("b"));
    }

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(BackendRoutes::new("ftp://example.com", "http://ok").is_err());
        assert!(BackendRoutes::new("not a url", "http://ok").is_err());
    }
}
