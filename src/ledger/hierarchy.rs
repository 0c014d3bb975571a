//! Domain validation for gateway requests.
//!
//! Shape is already enforced by the tool schema; this layer checks the rules a
//! schema cannot express: identifier format (the only thing standing between
//! caller input and URL construction), the organization → ledger → account
//! hierarchy, and which operations need `id` or `data`. Every rule runs, so a
//! caller sees all of their mistakes at once.

use crate::constants::identifiers::ID_PATTERN;
use crate::constants::pagination::{MAX_LIMIT, MIN_LIMIT};
use crate::ledger::types::{Operation, OperationParams, ResourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(ID_PATTERN).expect("valid id regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn message(&self) -> String {
        self.errors.join("; ")
    }

    pub fn details(&self) -> Value {
        serde_json::json!({ "errors": self.errors })
    }
}

pub fn is_valid_id(value: &str) -> bool {
    ID_RE.is_match(value)
}

pub fn validate_request(
    operation: Operation,
    resource: ResourceKind,
    params: &OperationParams,
) -> ValidationReport {
    let mut errors = Vec::new();
    let hierarchy = &params.hierarchy;

    let id_fields = [
        ("organizationId", hierarchy.organization_id.as_deref()),
        ("ledgerId", hierarchy.ledger_id.as_deref()),
        ("accountId", hierarchy.account_id.as_deref()),
        ("id", params.id.as_deref()),
    ];
    for (field, value) in id_fields {
        if let Some(value) = value {
            if !is_valid_id(value) {
                errors.push(format!("Invalid {} format", field));
            }
        }
    }

    if hierarchy.ledger_id.is_some() && hierarchy.organization_id.is_none() {
        errors.push("organizationId is required when ledgerId is provided".to_string());
    }
    if resource.requires_organization()
        && hierarchy.organization_id.is_none()
        && hierarchy.ledger_id.is_none()
    {
        errors.push(format!(
            "organizationId is required for {} operations",
            resource
        ));
    }
    if resource.requires_ledger() && hierarchy.ledger_id.is_none() {
        errors.push(format!("ledgerId is required for {} operations", resource));
    }
    if resource.requires_account() && hierarchy.account_id.is_none() {
        errors.push(format!(
            "accountId is required for {} operations",
            resource.entity_name()
        ));
    }
    if resource.is_read_only() && operation.is_write() {
        errors.push(format!("{} are read-only", resource));
    }

    if operation.requires_id() && params.id.is_none() {
        errors.push("id is required for get/update/delete operations".to_string());
    }
    if operation.requires_data() && params.payload().is_none() {
        errors.push("data is required for create/update operations".to_string());
    }

    if operation == Operation::List {
        if let Some(pagination) = params.pagination.as_ref().filter(|p| p.limit.is_some()) {
            match pagination.whole_limit() {
                None => errors.push("pagination.limit must be a whole number".to_string()),
                Some(limit) if limit < MIN_LIMIT as i64 || limit > MAX_LIMIT as i64 => {
                    errors.push(format!(
                        "pagination.limit must be between {} and {}",
                        MIN_LIMIT, MAX_LIMIT
                    ))
                }
                Some(_) => {}
            }
        }
    }

    ValidationReport::from_errors(errors)
}
