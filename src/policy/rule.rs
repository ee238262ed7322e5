// CLASSIFICATION: COMMUNITY
// Filename: rule.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Policy rules and the record formats they are loaded from.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::pool::work::{ProcName, INTERFACE_TOKEN_MAX};

/// Handle value of rules that did not come from the text node.
pub const NO_HANDLE: i32 = -1;

/// How a matched rule treats the priority flags of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyType {
    /// Force VIP and urgent.
    All,
    /// Keep the caller's priority only when the filters pass.
    FlagMask,
    /// Force VIP only.
    VipThreadOnly,
}

impl PolicyType {
    pub fn code(self) -> i64 {
        match self {
            PolicyType::All => 0,
            PolicyType::FlagMask => 1,
            PolicyType::VipThreadOnly => 2,
        }
    }
}

impl TryFrom<i64> for PolicyType {
    type Error = RuleError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PolicyType::All),
            1 => Ok(PolicyType::FlagMask),
            2 => Ok(PolicyType::VipThreadOnly),
            other => Err(RuleError::UnknownPolicyType(other)),
        }
    }
}

fn default_handle() -> i32 {
    NO_HANDLE
}

/// Raw rule record as submitted by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub interface_token: String,
    #[serde(default)]
    pub tr_codes: Vec<u32>,
    #[serde(default)]
    pub server_proc_name: String,
    #[serde(default)]
    pub client_proc_name: String,
    pub policy_type: i64,
    #[serde(default = "default_handle")]
    pub handle: i32,
}

impl RuleSpec {
    pub fn new(interface_token: &str, tr_codes: &[u32], policy_type: PolicyType) -> Self {
        Self {
            interface_token: interface_token.to_owned(),
            tr_codes: tr_codes.to_vec(),
            server_proc_name: String::new(),
            client_proc_name: String::new(),
            policy_type: policy_type.code(),
            handle: NO_HANDLE,
        }
    }

    pub fn server(mut self, name: &str) -> Self {
        self.server_proc_name = name.to_owned();
        self
    }

    pub fn client(mut self, name: &str) -> Self {
        self.client_proc_name = name.to_owned();
        self
    }

    /// Parse `token,codes,client,server,type[,handle]`, codes `|`-separated.
    ///
    /// Zero codes are dropped; an empty code field is a wildcard.
    pub fn parse_line(line: &str) -> Result<Self, RuleError> {
        let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        if !(5..=6).contains(&fields.len()) {
            return Err(RuleError::MalformedLine(line.trim().to_owned()));
        }
        let mut tr_codes = Vec::new();
        for code in fields[1].split('|').filter(|c| !c.is_empty()) {
            let code: u32 = code
                .parse()
                .map_err(|_| RuleError::InvalidCode(code.to_owned()))?;
            if code > 0 {
                tr_codes.push(code);
            }
        }
        let policy_type = fields[4]
            .parse()
            .map_err(|_| RuleError::MalformedLine(line.trim().to_owned()))?;
        let handle = match fields.get(5) {
            Some(h) => h
                .parse()
                .map_err(|_| RuleError::MalformedLine(line.trim().to_owned()))?,
            None => NO_HANDLE,
        };
        Ok(Self {
            interface_token: fields[0].to_owned(),
            tr_codes,
            client_proc_name: fields[2].to_owned(),
            server_proc_name: fields[3].to_owned(),
            policy_type,
            handle,
        })
    }
}

/// A validated rule. Immutable once published in a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    interface_token: String,
    tr_codes: BTreeSet<u32>,
    server: ProcName,
    client: ProcName,
    policy_type: PolicyType,
    handle: i32,
    index: usize,
}

impl PolicyRule {
    /// Validate a record; `index` is its position in the generation.
    pub fn from_spec(spec: &RuleSpec, index: usize) -> Result<Self, RuleError> {
        let token = spec.interface_token.trim();
        if token.is_empty() {
            return Err(RuleError::MissingToken);
        }
        if token.len() >= INTERFACE_TOKEN_MAX {
            return Err(RuleError::TokenTooLong {
                len: token.len(),
                max: INTERFACE_TOKEN_MAX - 1,
            });
        }
        Ok(Self {
            interface_token: token.to_owned(),
            tr_codes: spec.tr_codes.iter().copied().collect(),
            server: ProcName::new(&spec.server_proc_name),
            client: ProcName::new(&spec.client_proc_name),
            policy_type: PolicyType::try_from(spec.policy_type)?,
            handle: spec.handle,
            index,
        })
    }

    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            interface_token: self.interface_token.clone(),
            tr_codes: self.tr_codes.iter().copied().collect(),
            server_proc_name: self.server.to_string(),
            client_proc_name: self.client.to_string(),
            policy_type: self.policy_type.code(),
            handle: self.handle,
        }
    }

    pub fn interface_token(&self) -> &str {
        &self.interface_token
    }

    pub fn tr_codes(&self) -> &BTreeSet<u32> {
        &self.tr_codes
    }

    pub fn server(&self) -> &ProcName {
        &self.server
    }

    pub fn client(&self) -> &ProcName {
        &self.client
    }

    pub fn policy_type(&self) -> PolicyType {
        self.policy_type
    }

    pub fn handle(&self) -> i32 {
        self.handle
    }

    pub fn index(&self) -> usize {
        self.index
    }

    // === Filters (empty means any) ===

    pub fn accepts_code(&self, code: u32) -> bool {
        self.tr_codes.is_empty() || self.tr_codes.contains(&code)
    }

    pub fn accepts_server(&self, name: &ProcName) -> bool {
        self.server.is_empty() || self.server == *name
    }

    pub fn accepts_client(&self, name: &ProcName) -> bool {
        self.client.is_empty() || self.client == *name
    }
}

impl fmt::Display for PolicyRule {
    /// Renders `token,codes,client,server,type,handle,index`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.tr_codes.iter().map(u32::to_string).collect();
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.interface_token,
            codes.join("|"),
            self.client,
            self.server,
            self.policy_type.code(),
            self.handle,
            self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_with_codes_and_names() {
        let spec =
            RuleSpec::parse_line("android.window.ITaskOrganizer,1|2|0,launcher,system_server,0,7")
                .unwrap();
        assert_eq!(spec.interface_token, "android.window.ITaskOrganizer");
        assert_eq!(spec.tr_codes, vec![1, 2]);
        assert_eq!(spec.client_proc_name, "launcher");
        assert_eq!(spec.server_proc_name, "system_server");
        assert_eq!(spec.policy_type, 0);
        assert_eq!(spec.handle, 7);
    }

    #[test]
    fn parse_line_rejects_garbage() {
        assert!(matches!(
            RuleSpec::parse_line("just-a-token"),
            Err(RuleError::MalformedLine(_))
        ));
        assert!(matches!(
            RuleSpec::parse_line("tok,1|x,,,0"),
            Err(RuleError::InvalidCode(_))
        ));
    }

    #[test]
    fn validation_limits() {
        let long = RuleSpec::new(&"t".repeat(INTERFACE_TOKEN_MAX), &[], PolicyType::All);
        assert!(matches!(
            PolicyRule::from_spec(&long, 0),
            Err(RuleError::TokenTooLong { .. })
        ));
        let empty = RuleSpec::new("  ", &[], PolicyType::All);
        assert_eq!(PolicyRule::from_spec(&empty, 0), Err(RuleError::MissingToken));
        let mut bad = RuleSpec::new("tok", &[], PolicyType::All);
        bad.policy_type = 9;
        assert_eq!(
            PolicyRule::from_spec(&bad, 0),
            Err(RuleError::UnknownPolicyType(9))
        );
    }

    #[test]
    fn render_matches_listing_format() {
        let spec = RuleSpec::new("android.view.IRemoteAnimationRunner", &[9, 4], PolicyType::All)
            .server("com.android.systemui");
        let rule = PolicyRule::from_spec(&spec, 3).unwrap();
        assert_eq!(
            rule.to_string(),
            "android.view.IRemoteAnimationRunner,4|9,,ndroid.systemui,0,-1,3"
        );
    }
}
