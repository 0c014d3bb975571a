use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::List,
        Operation::Get,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Operation::List | Operation::Get => Method::GET,
            Operation::Create => Method::POST,
            Operation::Update => Method::PATCH,
            Operation::Delete => Method::DELETE,
        }
    }

    /// get/update/delete address a single entity by `params.id`.
    pub fn requires_id(self) -> bool {
        matches!(self, Operation::Get | Operation::Update | Operation::Delete)
    }

    pub fn requires_data(self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }

    pub fn is_write(self) -> bool {
        matches!(
            self,
            Operation::Create | Operation::Update | Operation::Delete
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Organizations,
    Ledgers,
    Accounts,
    Transactions,
    Balances,
    Portfolios,
    Assets,
    Operations,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Organizations,
        ResourceKind::Ledgers,
        ResourceKind::Accounts,
        ResourceKind::Transactions,
        ResourceKind::Balances,
        ResourceKind::Portfolios,
        ResourceKind::Assets,
        ResourceKind::Operations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Organizations => "organizations",
            ResourceKind::Ledgers => "ledgers",
            ResourceKind::Accounts => "accounts",
            ResourceKind::Transactions => "transactions",
            ResourceKind::Balances => "balances",
            ResourceKind::Portfolios => "portfolios",
            ResourceKind::Assets => "assets",
            ResourceKind::Operations => "operations",
        }
    }

    /// Singular noun used in previews ("account", "balance").
    pub fn entity_name(self) -> &'static str {
        match self {
            ResourceKind::Organizations => "organization",
            ResourceKind::Ledgers => "ledger",
            ResourceKind::Accounts => "account",
            ResourceKind::Transactions => "transaction",
            ResourceKind::Balances => "balance",
            ResourceKind::Portfolios => "portfolio",
            ResourceKind::Assets => "asset",
            ResourceKind::Operations => "operation",
        }
    }

    pub fn service(self) -> BackendService {
        match self {
            ResourceKind::Transactions | ResourceKind::Balances | ResourceKind::Operations => {
                BackendService::Transaction
            }
            ResourceKind::Organizations
            | ResourceKind::Ledgers
            | ResourceKind::Accounts
            | ResourceKind::Portfolios
            | ResourceKind::Assets => BackendService::Onboarding,
        }
    }

    pub fn requires_organization(self) -> bool {
        !matches!(self, ResourceKind::Organizations)
    }

    pub fn requires_ledger(self) -> bool {
        matches!(
            self,
            ResourceKind::Accounts
                | ResourceKind::Transactions
                | ResourceKind::Balances
                | ResourceKind::Operations
        )
    }

    pub fn requires_account(self) -> bool {
        matches!(self, ResourceKind::Balances | ResourceKind::Operations)
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, ResourceKind::Operations)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Test,
    Execute,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Test => "test",
            Mode::Execute => "execute",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendService {
    Onboarding,
    Transaction,
}

impl BackendService {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendService::Onboarding => "onboarding",
            BackendService::Transaction => "transaction",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHierarchy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// `limit` stays a raw JSON number so `5.0` reaches validation instead of
/// failing deserialisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl Pagination {
    /// The limit as an integer, or `None` when absent or fractional.
    pub fn whole_limit(&self) -> Option<i64> {
        let limit = self.limit.as_ref()?;
        if let Some(whole) = limit.as_i64() {
            return Some(whole);
        }
        limit
            .as_f64()
            .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
            .map(|value| value as i64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationParams {
    #[serde(flatten)]
    pub hierarchy: ResourceHierarchy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl OperationParams {
    /// `data: null` is treated the same as an absent payload.
    pub fn payload(&self) -> Option<&Value> {
        self.data.as_ref().filter(|value| !value.is_null())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: Operation,
    pub resource: ResourceKind,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub params: OperationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_deserializes_camel_case_hierarchy() {
        let raw = serde_json::json!({
            "operation": "get",
            "resource": "accounts",
            "mode": "execute",
            "params": {
                "organizationId": "org_1",
                "ledgerId": "led-1",
                "id": "acc1",
                "pagination": {"limit": 10}
            }
        });
        let request: OperationRequest = serde_json::from_value(raw).expect("parse request");
        assert_eq!(request.operation, Operation::Get);
        assert_eq!(request.resource, ResourceKind::Accounts);
        assert_eq!(request.mode, Mode::Execute);
        assert_eq!(
            request.params.hierarchy.organization_id.as_deref(),
            Some("org_1")
        );
        assert_eq!(request.params.hierarchy.ledger_id.as_deref(), Some("led-1"));
        assert_eq!(request.params.id.as_deref(), Some("acc1"));
        assert_eq!(
            request.params.pagination.and_then(|p| p.whole_limit()),
            Some(10)
        );
    }

    #[test]
    fn float_limits_deserialize_and_keep_their_fraction() {
        let whole: Pagination =
            serde_json::from_value(serde_json::json!({"limit": 5.0})).expect("whole float");
        assert_eq!(whole.whole_limit(), Some(5));

        let fractional: Pagination =
            serde_json::from_value(serde_json::json!({"limit": 2.5})).expect("fractional");
        assert!(fractional.limit.is_some());
        assert_eq!(fractional.whole_limit(), None);
    }

    #[test]
    fn mode_defaults_to_test() {
        let raw = serde_json::json!({"operation": "list", "resource": "organizations"});
        let request: OperationRequest = serde_json::from_value(raw).expect("parse request");
        assert_eq!(request.mode, Mode::Test);
        assert_eq!(request.params, OperationParams::default());
    }

    #[test]
    fn unknown_resource_is_rejected() {
        let raw = serde_json::json!({"operation": "list", "resource": "widgets"});
        assert!(serde_json::from_value::<OperationRequest>(raw).is_err());
    }

    #[test]
    fn services_split_by_resource() {
        assert_eq!(
            ResourceKind::Balances.service(),
            BackendService::Transaction
        );
        assert_eq!(
            ResourceKind::Operations.service(),
            BackendService::Transaction
        );
        assert_eq!(
            ResourceKind::Transactions.service(),
            BackendService::Transaction
        );
        assert_eq!(ResourceKind::Accounts.service(), BackendService::Onboarding);
        assert_eq!(ResourceKind::Assets.service(), BackendService::Onboarding);
    }
}
