// ── Completion-service synthesizer ──
//
// Production `Synthesizer`: one completion request per unmatched command,
// with the device context as a JSON user message and a system prompt that
// pins the reply to a single JSON object.

use async_trait::async_trait;
use iosim_api::{CompletionClient, CompletionRequest, Message, TransportConfig};
use tracing::debug;

use super::{Synthesis, SynthesisContext, Synthesizer};
use crate::config::FallbackConfig;
use crate::error::CoreError;

pub const SYSTEM_PROMPT: &str = r#"You are the command-line interface of a Cisco IOS 15 device in a training lab.
You receive one JSON object describing the device: its current CLI mode, its prompt, a summary of its configuration, and the command the user just typed.
The command was not recognized by the simulator's built-in parser. Decide what real IOS would do with it in that mode.

Reply with exactly one JSON object and nothing else:
{"valid": bool, "output": string, "error": string or null, "delta": object or null}

- valid: false if IOS would reject the command in this mode. Then set error to the IOS message (for example "% Invalid input detected at '^' marker.") and delta to null.
- output: text IOS prints for an accepted command; "" if it prints nothing.
- delta: state changes for an accepted command, or null. Allowed keys only:
  "hostname": string
  "mode": {"kind": "user"|"privileged"|"global-config"} or {"kind": "interface-config", "interface": name} or {"kind": "vlan-config", "vlan": number}
  "interfaces": {name: {"shutdown": bool, "address": "a.b.c.d/len", "description": string}}
  "vlans": {"id": {"name": string, "state": "active"|"suspended"}}
  "static_routes": [{"destination": "a.b.c.d/len", "next_hop": "a.b.c.d"} or {"destination": ..., "interface": name}]
Omit anything the command does not change. Never invent interfaces the device does not have."#;

pub struct CompletionSynthesizer {
    client: CompletionClient,
    max_tokens: u32,
}

impl CompletionSynthesizer {
    pub fn new(client: CompletionClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    pub fn from_config(config: &FallbackConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone().into(),
            timeout: config.timeout,
        };
        let client = CompletionClient::new(
            config.endpoint.clone(),
            config.model.clone(),
            &config.api_key,
            &transport,
        )?;
        Ok(Self::new(client, config.max_tokens))
    }
}

#[async_trait]
impl Synthesizer for CompletionSynthesizer {
    async fn synthesize(&self, context: &SynthesisContext) -> Result<Synthesis, CoreError> {
        let payload = serde_json::to_string(context)
            .map_err(|e| CoreError::Internal(format!("encode synthesis context: {e}")))?;
        let request = CompletionRequest::new(vec![Message::user(payload)])
            .with_system_prompt(SYSTEM_PROMPT)
            .with_max_tokens(self.max_tokens)
            .with_temperature(0.0);

        let response = self.client.complete(&request).await?;
        debug!(
            model = self.client.model(),
            input_tokens = response.tokens_used.input,
            output_tokens = response.tokens_used.output,
            "fallback completion received"
        );
        parse_synthesis(&response.content)
    }
}

/// Pull the JSON object out of a reply. Models wrap JSON in code fences
/// or prose often enough that the outermost braces are used, not the
/// whole text.
pub fn parse_synthesis(text: &str) -> Result<Synthesis, CoreError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(CoreError::MalformedReply {
            message: "no JSON object in reply".into(),
        });
    };
    if end < start {
        return Err(CoreError::MalformedReply {
            message: "no JSON object in reply".into(),
        });
    }
    serde_json::from_str(&text[start..=end]).map_err(|e| CoreError::MalformedReply {
        message: e.to_string(),
    })
}
