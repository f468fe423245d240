//! Rust impl block builder.

use super::Fn;
use crate::builder::{CodeBuilder, CodeFragment, Renderable};

/// Builder for inherent and trait impl blocks.
#[derive(Debug, Clone)]
pub struct Impl {
    target: String,
    trait_name: Option<String>,
    assoc_types: Vec<(String, String)>,
    methods: Vec<Fn>,
}

impl Impl {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            trait_name: None,
            assoc_types: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn for_trait(mut self, trait_name: impl Into<String>) -> Self {
        self.trait_name = Some(trait_name.into());
        self
    }

    pub fn assoc_type(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.assoc_types.push((name.into(), ty.into()));
        self
    }

    pub fn method(mut self, method: Fn) -> Self {
        self.methods.push(method);
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Fn>) -> Self {
        self.methods.extend(methods);
        self
    }

    fn header(&self) -> String {
        match &self.trait_name {
            Some(t) => format!("impl {} for {}", t, self.target),
            None => format!("impl {}", self.target),
        }
    }

    pub fn build(&self) -> String {
        let mut builder = CodeBuilder::rust();
        builder.emit(self);
        builder.build()
    }
}

impl Renderable for Impl {
    fn to_fragments(&self) -> Vec<CodeFragment> {
        if self.assoc_types.is_empty() && self.methods.is_empty() {
            return vec![CodeFragment::line(format!("{} {{}}", self.header()))];
        }

        let mut body: Vec<CodeFragment> = self
            .assoc_types
            .iter()
            .map(|(name, ty)| CodeFragment::line(format!("type {} = {};", name, ty)))
            .collect();

        for (i, method) in self.methods.iter().enumerate() {
            if i > 0 || !body.is_empty() {
                body.push(CodeFragment::Blank);
            }
            body.extend(method.to_fragments());
        }

        vec![CodeFragment::block(format!("{} {{", self.header()), body)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Receiver;

    #[test]
    fn test_empty_trait_impl() {
        let code = Impl::new("crate::Echo").for_trait("Lifecycle").build();
        assert_eq!(code, "impl Lifecycle for crate::Echo {}\n");
    }

    #[test]
    fn test_trait_impl_with_assoc_type() {
        let code = Impl::new("Session")
            .for_trait("PoolableModule")
            .assoc_type("Config", "EchoConfig")
            .method(
                Fn::new("key_hash")
                    .private()
                    .receiver(Receiver::Ref)
                    .returns("i32")
                    .body_line("1"),
            )
            .build();

        insta::assert_snapshot!(code, @r"
        impl PoolableModule for Session {
            type Config = EchoConfig;

            fn key_hash(&self) -> i32 {
                1
            }
        }
        ");
    }
}
