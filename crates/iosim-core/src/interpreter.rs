// ── Command interpreter ──
//
// Grammar first, fallback second. The fallback only ever sees lines the
// grammar reported as unmatched; a grammar rejection is final.

use tracing::debug;

use crate::command::CommandResult;
use crate::fallback::FallbackResolver;
use crate::grammar::{Grammar, Outcome};
use crate::model::{DeviceConfig, TopologyContext};

#[derive(Debug, Clone)]
pub struct Interpreter {
    grammar: Grammar,
    resolver: FallbackResolver,
}

impl Interpreter {
    pub fn new(resolver: FallbackResolver) -> Self {
        Self {
            grammar: Grammar::new(),
            resolver,
        }
    }

    /// Grammar only; unmatched lines are rejected as invalid input.
    pub fn offline() -> Self {
        Self::new(FallbackResolver::disabled())
    }

    pub fn resolver(&self) -> &FallbackResolver {
        &self.resolver
    }

    pub async fn interpret(
        &self,
        state: &DeviceConfig,
        line: &str,
        topology: Option<&TopologyContext>,
    ) -> CommandResult {
        match self.grammar.evaluate(state, line, topology) {
            Outcome::Matched(result) => {
                debug!(mode = %state.mode.kind(), valid = result.valid, "grammar matched");
                result
            }
            Outcome::Unmatched => {
                debug!(mode = %state.mode.kind(), "no grammar rule, deferring to fallback");
                self.resolver.resolve(state, line).await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::error::CoreError;
    use crate::fallback::{DEFAULT_TIMEOUT, Synthesis, SynthesisContext, Synthesizer};

    #[derive(Default)]
    struct Recorder {
        called: AtomicBool,
    }

    #[async_trait]
    impl Synthesizer for Recorder {
        async fn synthesize(&self, _context: &SynthesisContext) -> Result<Synthesis, CoreError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Synthesis {
                valid: true,
                output: "synthesized".into(),
                error: None,
                delta: None,
            })
        }
    }

    #[tokio::test]
    async fn grammar_rejection_never_reaches_fallback() {
        let recorder = Arc::new(Recorder::default());
        let interpreter = Interpreter::new(FallbackResolver::new(recorder.clone(), DEFAULT_TIMEOUT));
        let r1 = DeviceConfig::router("R1");

        let result = interpreter.interpret(&r1, "enable now", None).await;
        assert!(!result.valid);
        assert!(!recorder.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unmatched_line_goes_to_fallback() {
        let recorder = Arc::new(Recorder::default());
        let interpreter = Interpreter::new(FallbackResolver::new(recorder.clone(), DEFAULT_TIMEOUT));
        let r1 = DeviceConfig::router("R1");

        let result = interpreter.interpret(&r1, "frobnicate the uplink", None).await;
        assert!(recorder.called.load(Ordering::SeqCst));
        assert_eq!(result.output, "synthesized");
    }

    #[tokio::test]
    async fn offline_interpreter_rejects_unmatched() {
        let r1 = DeviceConfig::router("R1");
        let result = Interpreter::offline()
            .interpret(&r1, "frobnicate", None)
            .await;
        assert!(!result.valid);
        assert!(result.error.unwrap().ends_with("% Invalid input detected at '^' marker."));
    }
}
