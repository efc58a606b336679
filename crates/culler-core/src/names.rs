//! Cluster and ASG name parsing.
//!
//! Cluster names follow `service[-stack[-detail]]`; ASG names append a
//! `-vNNN` push number. The stack and detail fields are what exceptions
//! match against.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::NameError;

static PUSH_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^([-a-zA-Z0-9._~^]*)-v([0-9]{3,6})$"));

static NAME_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9._]+)(?:-([a-zA-Z0-9._]*)(?:-([-a-zA-Z0-9._~^]*?))?)?$"));

/// The parts of a cluster or ASG name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    /// The cluster part (`service-stack-detail`), push number stripped.
    pub cluster: String,
    pub service: String,
    /// Empty when the name has no stack.
    pub stack: String,
    /// Empty when the name has no detail.
    pub detail: String,
    pub push: Option<u32>,
}

impl Names {
    /// Parse a cluster or ASG name.
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let invalid = || NameError {
            name: name.to_string(),
        };

        let push_re = PUSH_RE.as_ref().map_err(|_| invalid())?;
        let name_re = NAME_RE.as_ref().map_err(|_| invalid())?;

        let (cluster, push) = match push_re.captures(name) {
            Some(caps) => {
                let push = caps[2].parse::<u32>().map_err(|_| invalid())?;
                (caps[1].to_string(), Some(push))
            }
            None => (name.to_string(), None),
        };

        let caps = name_re.captures(&cluster).ok_or_else(invalid)?;
        let field = |i: usize| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();

        Ok(Self {
            service: field(1),
            stack: field(2),
            detail: field(3),
            cluster,
            push,
        })
    }
}
