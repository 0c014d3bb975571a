/// Maps a terminal error message to remediation tips by keyword.
pub fn troubleshooting_tips(error: &str) -> Vec<String> {
    let lower = error.to_lowercase();
    let mut tips: Vec<&str> = Vec::new();

    if lower.contains("network")
        || lower.contains("fetch")
        || lower.contains("connect")
        || lower.contains("timed out")
        || lower.contains("dns")
    {
        tips.extend([
            "Check that the ledger services are running and reachable",
            "Verify LEDGER_ONBOARDING_URL and LEDGER_TRANSACTION_URL point at the right hosts",
            "Check firewall or proxy settings between this host and the backend",
        ]);
    }

    if lower.contains("auth")
        || lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
    {
        tips.extend([
            "Verify LEDGER_CLIENT_ID and LEDGER_CLIENT_SECRET, or LEDGER_API_KEY",
            "Check that LEDGER_AUTH_TOKEN_URL is the correct token endpoint",
            "Make sure the credentials have permission for this resource",
        ]);
    }

    if lower.contains("404") || lower.contains("not found") {
        tips.extend([
            "Verify that the organizationId, ledgerId and accountId exist",
            "List the parent resource first to discover valid ids",
        ]);
    }

    if lower.contains("400") || lower.contains("bad request") || lower.contains("invalid") {
        tips.extend([
            "Check the data payload against the resource's required fields",
            "Run the same request with mode \"test\" to inspect the expected payload shape",
        ]);
    }

    if tips.is_empty() {
        tips.extend([
            "Check the ledger API documentation for this operation",
            "Check the status of the ledger services",
            "Try the request with mode \"test\" to validate parameters without calling the API",
        ]);
    }

    tips.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_get_connectivity_tips() {
        let tips = troubleshooting_tips("error sending request: connection refused");
        assert!(tips.iter().any(|tip| tip.contains("reachable")));
    }

    #[test]
    fn auth_errors_get_credential_tips() {
        let tips = troubleshooting_tips("Request failed with status 401");
        assert!(tips.iter().any(|tip| tip.contains("LEDGER_CLIENT_ID")));
        assert!(!tips.iter().any(|tip| tip.contains("documentation")));
    }

    #[test]
    fn not_found_and_bad_request_combine() {
        let tips = troubleshooting_tips("404 not found after 400 bad request");
        assert!(tips.iter().any(|tip| tip.contains("exist")));
        assert!(tips.iter().any(|tip| tip.contains("payload")));
    }

    #[test]
    fn unknown_errors_fall_back_to_generic_tips() {
        let tips = troubleshooting_tips("something odd happened");
        assert_eq!(tips.len(), 3);
        assert!(tips[0].contains("documentation"));
        assert!(tips[1].contains("status"));
        assert!(tips[2].contains("test"));
    }
}
