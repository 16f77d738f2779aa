use crate::app::command_catalog::{function_def, function_ids, FunctionDef};
use crate::artifacts::{resource_templates, ArtifactError, ArtifactStore};
use crate::patch::PatchOptions;
use crate::shared::ids::{NodeId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionCall {
    CodeFilesList {
        workflow_id: WorkflowId,
    },
    CodeFilesRead {
        workflow_id: WorkflowId,
        node_id: NodeId,
    },
    CodeFilesWrite {
        workflow_id: WorkflowId,
        node_id: NodeId,
        content: String,
        expected_etag: Option<String>,
        language: Option<String>,
    },
    SetFilesList {
        workflow_id: WorkflowId,
    },
    SetFilesRead {
        workflow_id: WorkflowId,
        node_id: NodeId,
    },
    SetFilesWrite {
        workflow_id: WorkflowId,
        node_id: NodeId,
        content: String,
        expected_etag: Option<String>,
    },
    WorkflowFilePatch {
        uri: String,
        patch: String,
        expected_etag: Option<String>,
        options: PatchOptions,
    },
    ResourcesList {
        cursor: Option<String>,
    },
    ResourcesRead {
        uri: String,
    },
    ResourcesWrite {
        uri: String,
        text: String,
        expected_etag: Option<String>,
    },
    ResourcesTemplates,
}

/// Envelope returned for every function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl FunctionResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn failure(err: &ArtifactError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            code: Some(err.kind().code().to_string()),
        }
    }
}

pub fn execute_function(
    store: &ArtifactStore,
    function_id: &str,
    args: &Map<String, Value>,
) -> FunctionResponse {
    match run_function(store, function_id, args) {
        Ok(data) => FunctionResponse::ok(data),
        Err(err) => FunctionResponse::failure(&err),
    }
}

fn run_function(
    store: &ArtifactStore,
    function_id: &str,
    args: &Map<String, Value>,
) -> Result<Value, ArtifactError> {
    let def = function_def(function_id).ok_or_else(|| {
        ArtifactError::InvalidArgument(format!("unknown function `{function_id}`"))
    })?;
    check_arg_types(def, args)?;
    let call = plan_function_invocation(function_id, args)?;
    store.ensure_configured()?;
    execute_call(store, call)
}

fn check_arg_types(def: &FunctionDef, args: &Map<String, Value>) -> Result<(), ArtifactError> {
    for arg in def.args {
        match args.get(arg.name) {
            Some(Value::Null) | None => {}
            Some(value) if arg.arg_type.matches(value) => {}
            Some(_) => {
                return Err(ArtifactError::InvalidArgument(format!(
                    "argument `{}` must be a {}",
                    arg.name, arg.arg_type
                )))
            }
        }
    }
    Ok(())
}

pub fn plan_function_invocation(
    function_id: &str,
    args: &Map<String, Value>,
) -> Result<FunctionCall, ArtifactError> {
    match function_id {
        function_ids::CODE_FILES_LIST => Ok(FunctionCall::CodeFilesList {
            workflow_id: workflow_id_arg(args)?,
        }),
        function_ids::CODE_FILES_READ => Ok(FunctionCall::CodeFilesRead {
            workflow_id: workflow_id_arg(args)?,
            node_id: node_id_arg(args)?,
        }),
        function_ids::CODE_FILES_WRITE => Ok(FunctionCall::CodeFilesWrite {
            workflow_id: workflow_id_arg(args)?,
            node_id: node_id_arg(args)?,
            content: content_arg(args, "content")?,
            expected_etag: optional_string_arg(args, "expectedEtag")?,
            language: optional_string_arg(args, "language")?,
        }),
        function_ids::SET_FILES_LIST => Ok(FunctionCall::SetFilesList {
            workflow_id: workflow_id_arg(args)?,
        }),
        function_ids::SET_FILES_READ => Ok(FunctionCall::SetFilesRead {
            workflow_id: workflow_id_arg(args)?,
            node_id: node_id_arg(args)?,
        }),
        function_ids::SET_FILES_WRITE => Ok(FunctionCall::SetFilesWrite {
            workflow_id: workflow_id_arg(args)?,
            node_id: node_id_arg(args)?,
            content: content_arg(args, "content")?,
            expected_etag: optional_string_arg(args, "expectedEtag")?,
        }),
        function_ids::WORKFLOW_FILE_PATCH => Ok(FunctionCall::WorkflowFilePatch {
            uri: required_string_arg(args, "uri")?,
            patch: required_string_arg(args, "patch")?,
            expected_etag: optional_string_arg(args, "expectedEtag")?,
            options: PatchOptions {
                min_context_lines: optional_usize_arg(args, "minContextLines")?.unwrap_or(0),
                max_fuzz: optional_usize_arg(args, "maxFuzz")?.unwrap_or(0),
                ignore_whitespace_in_context: optional_bool_arg(
                    args,
                    "ignoreWhitespaceInContext",
                )?
                .unwrap_or(false),
            },
        }),
        function_ids::RESOURCES_LIST => Ok(FunctionCall::ResourcesList {
            cursor: optional_string_arg(args, "cursor")?,
        }),
        function_ids::RESOURCES_READ => Ok(FunctionCall::ResourcesRead {
            uri: required_string_arg(args, "uri")?,
        }),
        function_ids::RESOURCES_WRITE => Ok(FunctionCall::ResourcesWrite {
            uri: required_string_arg(args, "uri")?,
            text: content_arg(args, "text")?,
            expected_etag: optional_string_arg(args, "expectedEtag")?,
        }),
        function_ids::RESOURCES_TEMPLATES => Ok(FunctionCall::ResourcesTemplates),
        other => Err(ArtifactError::InvalidArgument(format!(
            "unknown function `{other}`"
        ))),
    }
}

pub fn execute_call(store: &ArtifactStore, call: FunctionCall) -> Result<Value, ArtifactError> {
    match call {
        FunctionCall::CodeFilesList { workflow_id } => {
            let files = store.list_code_files(&workflow_id)?;
            Ok(json!({
                "workflowId": workflow_id,
                "returned": files.len(),
                "files": files,
            }))
        }
        FunctionCall::CodeFilesRead {
            workflow_id,
            node_id,
        } => to_value(store.read_code_file(&workflow_id, &node_id)?),
        FunctionCall::CodeFilesWrite {
            workflow_id,
            node_id,
            content,
            expected_etag,
            language,
        } => to_value(store.write_code_file(
            &workflow_id,
            &node_id,
            &content,
            expected_etag.as_deref(),
            language.as_deref(),
        )?),
        FunctionCall::SetFilesList { workflow_id } => {
            let files = store.list_set_files(&workflow_id)?;
            Ok(json!({
                "workflowId": workflow_id,
                "returned": files.len(),
                "files": files,
            }))
        }
        FunctionCall::SetFilesRead {
            workflow_id,
            node_id,
        } => to_value(store.read_set_file(&workflow_id, &node_id)?),
        FunctionCall::SetFilesWrite {
            workflow_id,
            node_id,
            content,
            expected_etag,
        } => to_value(store.write_set_file(
            &workflow_id,
            &node_id,
            &content,
            expected_etag.as_deref(),
        )?),
        FunctionCall::WorkflowFilePatch {
            uri,
            patch,
            expected_etag,
            options,
        } => to_value(store.patch_resource(&uri, &patch, expected_etag.as_deref(), &options)?),
        FunctionCall::ResourcesList { cursor } => {
            to_value(store.list_resource_page(cursor.as_deref())?)
        }
        FunctionCall::ResourcesRead { uri } => to_value(store.read_resource(&uri)?),
        FunctionCall::ResourcesWrite {
            uri,
            text,
            expected_etag,
        } => to_value(store.write_resource(&uri, &text, expected_etag.as_deref())?),
        FunctionCall::ResourcesTemplates => Ok(json!({
            "resourceTemplates": resource_templates(),
        })),
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ArtifactError> {
    serde_json::to_value(value)
        .map_err(|err| ArtifactError::InvalidArgument(format!("failed to encode result: {err}")))
}

fn workflow_id_arg(args: &Map<String, Value>) -> Result<WorkflowId, ArtifactError> {
    let raw = required_string_arg(args, "workflowId")?;
    WorkflowId::parse(&raw).map_err(ArtifactError::InvalidIdentifier)
}

fn node_id_arg(args: &Map<String, Value>) -> Result<NodeId, ArtifactError> {
    let raw = required_string_arg(args, "nodeId")?;
    NodeId::parse(&raw).map_err(ArtifactError::InvalidIdentifier)
}

fn required_string_arg(args: &Map<String, Value>, arg: &str) -> Result<String, ArtifactError> {
    match args.get(arg) {
        Some(Value::String(v)) if !v.trim().is_empty() => Ok(v.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => Err(ArtifactError::InvalidArgument(
            format!("missing required function argument `{arg}`"),
        )),
        Some(_) => Err(ArtifactError::InvalidArgument(format!(
            "argument `{arg}` must be a string"
        ))),
    }
}

/// File content may legitimately be empty.
fn content_arg(args: &Map<String, Value>, arg: &str) -> Result<String, ArtifactError> {
    match args.get(arg) {
        Some(Value::String(v)) => Ok(v.clone()),
        Some(Value::Null) | None => Err(ArtifactError::InvalidArgument(format!(
            "missing required function argument `{arg}`"
        ))),
        Some(_) => Err(ArtifactError::InvalidArgument(format!(
            "argument `{arg}` must be a string"
        ))),
    }
}

fn optional_string_arg(
    args: &Map<String, Value>,
    arg: &str,
) -> Result<Option<String>, ArtifactError> {
    match args.get(arg) {
        Some(Value::String(v)) if !v.trim().is_empty() => Ok(Some(v.clone())),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(_) => Err(ArtifactError::InvalidArgument(format!(
            "argument `{arg}` must be a string"
        ))),
    }
}

fn optional_usize_arg(
    args: &Map<String, Value>,
    arg: &str,
) -> Result<Option<usize>, ArtifactError> {
    match args.get(arg) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => {
            if let Some(v) = value.as_u64() {
                return usize::try_from(v).map(Some).map_err(|_| {
                    ArtifactError::InvalidArgument(format!("argument `{arg}` is too large"))
                });
            }
            if value.as_i64().is_some() {
                return Err(ArtifactError::InvalidArgument(format!(
                    "argument `{arg}` must be >= 0"
                )));
            }
            Err(ArtifactError::InvalidArgument(format!(
                "argument `{arg}` must be an integer"
            )))
        }
    }
}

fn optional_bool_arg(args: &Map<String, Value>, arg: &str) -> Result<Option<bool>, ArtifactError> {
    match args.get(arg) {
        Some(Value::Bool(v)) => Ok(Some(*v)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(ArtifactError::InvalidArgument(format!(
            "argument `{arg}` must be a boolean"
        ))),
    }
}
