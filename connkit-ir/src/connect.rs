//! Connect triple and connection key shape.

use serde::Serialize;

use crate::TypeRef;

/// The connect/disconnect/validate methods of a module.
///
/// The key-flagged connect parameters define the shape of the connection key.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectTriple {
    pub connect: String,
    pub params: Vec<ConnectParam>,
    pub disconnect: String,
    pub validate: Option<String>,
    /// Method returning a connection identifier, used in log lines.
    pub identifier: Option<String>,
}

/// A connect-method parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectParam {
    pub name: String,
    pub ty: TypeRef,
    pub is_key: bool,
}

impl ConnectTriple {
    /// Key parameters, in declaration order.
    pub fn key_params(&self) -> impl Iterator<Item = &ConnectParam> {
        self.params.iter().filter(|p| p.is_key)
    }

    /// Non-key parameters, in declaration order.
    pub fn extra_params(&self) -> impl Iterator<Item = &ConnectParam> {
        self.params.iter().filter(|p| !p.is_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, is_key: bool) -> ConnectParam {
        ConnectParam {
            name: name.into(),
            ty: TypeRef::parse("String").unwrap(),
            is_key,
        }
    }

    #[test]
    fn test_key_params_keep_order() {
        let triple = ConnectTriple {
            connect: "connect".into(),
            params: vec![param("user", true), param("pass", false), param("tenant", true)],
            disconnect: "disconnect".into(),
            validate: None,
            identifier: None,
        };

        let keys: Vec<_> = triple.key_params().map(|p| p.name.as_str()).collect();
        assert_eq!(keys, ["user", "tenant"]);
        let extra: Vec<_> = triple.extra_params().map(|p| p.name.as_str()).collect();
        assert_eq!(extra, ["pass"]);
    }
}
