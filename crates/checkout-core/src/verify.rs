//! Session Verification
//!
//! Local check that a multi-item session recorded what was submitted. No
//! network calls, never fails the run: the outcome is informational.

use serde::{Deserialize, Serialize};

use crate::model::{CreatedProduct, LinkedSession};
use crate::order::order_total;

/// One verification check
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn new(name: &str, passed: bool, detail: String) -> Self {
        Self { name: name.into(), passed, detail }
    }
}

/// Outcome of verifying a linked session
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
}

impl VerificationReport {
    /// True when every check passed
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Emit one log line per check
    pub fn log(&self) {
        for check in &self.checks {
            if check.passed {
                tracing::info!(check = %check.name, "✓ {}", check.detail);
            } else {
                tracing::warn!(check = %check.name, "✗ {}", check.detail);
            }
        }
    }
}

/// Compare a linked session against the products that went into it
pub fn verify_session(session: &LinkedSession, products: &[CreatedProduct]) -> VerificationReport {
    let mut checks = Vec::with_capacity(products.len() + 2);

    for product in products {
        let found = session.combined_name.contains(&product.name);
        let detail = if found {
            format!("'{}' found in combined name", product.name)
        } else {
            format!("'{}' missing from combined name '{}'", product.name, session.combined_name)
        };
        checks.push(CheckResult::new("product_name", found, detail));
    }

    let expected_total = order_total(products);
    let total_ok = session.total_amount == expected_total;
    checks.push(CheckResult::new(
        "total_amount",
        total_ok,
        if total_ok {
            format!("total amount is {expected_total}")
        } else {
            format!("total amount mismatch: expected {expected_total}, got {}", session.total_amount)
        },
    ));

    let count_ok = session.product_count == products.len();
    checks.push(CheckResult::new(
        "product_count",
        count_ok,
        if count_ok {
            format!("product count is {}", products.len())
        } else {
            format!("product count mismatch: expected {}, got {}", products.len(), session.product_count)
        },
    ));

    VerificationReport { checks }
}
