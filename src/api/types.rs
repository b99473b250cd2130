//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request to execute a workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteWorkflowRequest {
    /// The customer message to process.
    pub user_input: String,

    /// Workflow kind (only `customer_support` is defined today).
    #[serde(default = "default_workflow_type")]
    pub workflow_type: String,
}

fn default_workflow_type() -> String {
    "customer_support".to_string()
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query parameters for listing workflows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListWorkflowsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_type_defaults_when_omitted() {
        let request: ExecuteWorkflowRequest =
            serde_json::from_str(r#"{"user_input": "where is my order?"}"#).unwrap();
        assert_eq!(request.workflow_type, "customer_support");
    }
}
