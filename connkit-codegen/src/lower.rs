//! Lowering from the manifest to module descriptors.
//!
//! Parameter kinds are decided here, once per parameter. Nothing downstream
//! inspects type names again.

use connkit_ir::{
    ConfigurableField, ConnectParam, ConnectTriple, DefaultValue, EnumDecl, ExhaustedAction,
    LifecycleHooks, ModuleDescriptor, OAuthDecl, Operation, Parameter, ParameterKind,
    PoolingProfileDecl, Shape, Source, TransformerDecl, TypeRef,
};
use connkit_manifest::{
    ExhaustedActionDecl, Manifest, OperationDecl, ParamDecl, ParamKindDecl, SourceDecl,
};

use crate::pipeline::GenerationError;

/// Lower a validated manifest into a module descriptor.
pub fn lower(manifest: &Manifest) -> Result<ModuleDescriptor, GenerationError> {
    let module = &manifest.module;
    let name = module.name.as_str();

    let fields = manifest
        .fields
        .iter()
        .map(|f| {
            Ok(ConfigurableField {
                name: f.name.clone(),
                ty: f.ty.clone(),
                default: default_value(name, &f.name, f.default.as_ref())?,
                optional: f.optional,
                description: f.description.clone(),
            })
        })
        .collect::<Result<Vec<_>, GenerationError>>()?;

    let connect = manifest.connect.as_ref().map(|c| ConnectTriple {
        connect: c.method.clone(),
        params: c
            .params
            .iter()
            .map(|p| ConnectParam {
                name: p.name.clone(),
                ty: p.ty.clone(),
                is_key: p.key,
            })
            .collect(),
        disconnect: c.disconnect.clone(),
        validate: c.validate.clone(),
        identifier: c.identifier.clone(),
    });

    let operations = manifest
        .operations
        .iter()
        .map(|op| lower_operation(name, op))
        .collect::<Result<Vec<_>, _>>()?;

    let sources = manifest
        .sources
        .iter()
        .map(|source| lower_source(name, source))
        .collect::<Result<Vec<_>, _>>()?;

    let enums = manifest
        .enums
        .iter()
        .map(|e| EnumDecl {
            type_path: e.type_path.clone(),
            variants: e.variants.clone(),
        })
        .collect();

    let transformers = manifest
        .transformers
        .iter()
        .map(|t| TransformerDecl {
            method: t.method.clone(),
            from: t.from.clone(),
            to: t.to.clone(),
            weight: t.weight,
            description: t.description.clone(),
        })
        .collect();

    let lifecycle = LifecycleHooks {
        initialise: module.lifecycle.initialise.clone(),
        start: module.lifecycle.start.clone(),
        stop: module.lifecycle.stop.clone(),
        dispose: module.lifecycle.dispose.clone(),
    };

    let pooling = module.pooling.as_ref().map(|p| PoolingProfileDecl {
        max_active: p.max_active,
        max_idle: p.max_idle,
        max_wait_ms: p.max_wait_ms,
        exhausted_action: p.exhausted_action.map(|a| match a {
            ExhaustedActionDecl::Fail => ExhaustedAction::Fail,
            ExhaustedActionDecl::Block => ExhaustedAction::Block,
            ExhaustedActionDecl::Grow => ExhaustedAction::Grow,
        }),
    });

    let oauth = manifest.oauth.as_ref().map(|o| OAuthDecl {
        authorization_url: o.authorization_url.clone(),
        access_token_url: o.access_token_url.clone(),
        scope: o.scope.clone(),
        callback_path: o.callback_path.clone(),
    });

    Ok(ModuleDescriptor {
        name: module.name.clone(),
        type_path: module.type_path.clone(),
        error_type: module.error.clone(),
        description: module.description.clone(),
        fields,
        connect,
        operations,
        poolable: module.poolable,
        lifecycle,
        pooling,
        oauth,
        sources,
        enums,
        transformers,
    })
}

/// Lower several manifests, rejecting duplicate module names.
pub fn lower_all(manifests: &[Manifest]) -> Result<Vec<ModuleDescriptor>, GenerationError> {
    let mut modules: Vec<ModuleDescriptor> = Vec::with_capacity(manifests.len());
    for manifest in manifests {
        let module = lower(manifest)?;
        if modules.iter().any(|m| m.name == module.name) {
            return Err(GenerationError::descriptor(
                &module.name,
                "module is declared more than once",
            ));
        }
        modules.push(module);
    }
    Ok(modules)
}

fn lower_params(module: &str, params: &[ParamDecl]) -> Result<Vec<Parameter>, GenerationError> {
    params
        .iter()
        .map(|p| {
            Ok(Parameter {
                name: p.name.clone(),
                ty: p.ty.clone(),
                kind: classify(p),
                default: default_value(module, &p.name, p.default.as_ref())?,
                optional: p.optional,
            })
        })
        .collect()
}

fn lower_operation(module: &str, op: &OperationDecl) -> Result<Operation, GenerationError> {
    let params = lower_params(module, &op.params)?;

    Ok(Operation {
        name: op.name.clone(),
        method: op.method_name(),
        returns: op.returns.clone(),
        params,
        invalidate_on: op.invalidate_on.clone(),
        retry_max: op.retry_max.unwrap_or(Operation::DEFAULT_RETRY_MAX),
        mime_type: op.mime_type.clone(),
        description: op.description.clone(),
    })
}

fn lower_source(module: &str, source: &SourceDecl) -> Result<Source, GenerationError> {
    Ok(Source {
        name: source.name.clone(),
        method: source.method_name(),
        params: lower_params(module, &source.params)?,
        invalidate_on: source.invalidate_on.clone(),
        retry_max: source.retry_max.unwrap_or(Source::DEFAULT_RETRY_MAX),
        description: source.description.clone(),
    })
}

/// Decide how a parameter receives its value. An explicit kind wins over
/// the declared type.
pub fn classify(param: &ParamDecl) -> ParameterKind {
    let header = || param.header.clone().unwrap_or_else(|| param.name.clone());

    match param.kind {
        Some(ParamKindDecl::Plain) => ParameterKind::Plain,
        Some(ParamKindDecl::NestedProcessor) => ParameterKind::NestedInvokable {
            many: matches!(param.ty.without_option().shape(), Shape::List(_)),
        },
        Some(ParamKindDecl::Callback) => ParameterKind::Callback,
        Some(ParamKindDecl::Payload) => ParameterKind::Payload,
        Some(ParamKindDecl::HeaderIn) => ParameterKind::HeaderIn { header: header() },
        Some(ParamKindDecl::HeaderOut) => ParameterKind::HeaderOut,
        Some(ParamKindDecl::HeaderInvocation) => {
            ParameterKind::HeaderInvocation { header: header() }
        }
        Some(ParamKindDecl::ConnectionField) => ParameterKind::ConnectionField,
        Some(ParamKindDecl::SourceCallback) => ParameterKind::SourceCallback,
        None => infer_kind(&param.ty),
    }
}

fn infer_kind(ty: &TypeRef) -> ParameterKind {
    let ty = ty.without_option();
    if let Shape::List(element) = ty.shape()
        && element.last_segment() == Some("NestedProcessor")
    {
        return ParameterKind::NestedInvokable { many: true };
    }

    match ty.last_segment() {
        Some("NestedProcessor") => ParameterKind::NestedInvokable { many: false },
        Some("Callback") => ParameterKind::Callback,
        Some("OutboundHeaders") => ParameterKind::HeaderOut,
        Some("SourceCallback") => ParameterKind::SourceCallback,
        _ => ParameterKind::Plain,
    }
}

fn default_value(
    module: &str,
    name: &str,
    value: Option<&toml::Value>,
) -> Result<Option<DefaultValue>, GenerationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let default = match value {
        toml::Value::String(s) => DefaultValue::String(s.clone()),
        toml::Value::Integer(i) => DefaultValue::Int(*i),
        toml::Value::Float(f) => DefaultValue::Float(*f),
        toml::Value::Boolean(b) => DefaultValue::Bool(*b),
        other => {
            return Err(GenerationError::descriptor(
                module,
                format!(
                    "default of '{}' must be a string, integer, float or boolean, found {}",
                    name,
                    other.type_str()
                ),
            ));
        }
    };
    Ok(Some(default))
}
