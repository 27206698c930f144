//! Caller-defined input/output validation run at the edges of `interact`.

use async_trait::async_trait;

/// Why a guardrail rejected its input.
#[derive(Debug, Clone)]
pub struct GuardrailViolation {
    pub reason: String,
}

impl GuardrailViolation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A single validation check, run either over the concatenated user text
/// at entry (`inputGuardrails`) or over the final assistant text at exit
/// (`outputGuardrails`).
#[async_trait]
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, text: &str) -> Result<(), GuardrailViolation>;
}

/// A guardrail built from a synchronous predicate, for the common case
/// of a pure text check with no external calls.
pub struct PredicateGuardrail<F> {
    name: String,
    predicate: F,
}

impl<F> PredicateGuardrail<F>
where
    F: Fn(&str) -> Result<(), String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

#[async_trait]
impl<F> Guardrail for PredicateGuardrail<F>
where
    F: Fn(&str) -> Result<(), String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, text: &str) -> Result<(), GuardrailViolation> {
        (self.predicate)(text).map_err(GuardrailViolation::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn predicate_guardrail_rejects_matching_text() {
        let guardrail = PredicateGuardrail::new("no-password", |text: &str| {
            if text.to_lowercase().contains("password") {
                Err("input mentions a password".to_string())
            } else {
                Ok(())
            }
        });
        assert!(guardrail.check("what is my password?").await.is_err());
        assert!(guardrail.check("what is the weather?").await.is_ok());
    }
}
