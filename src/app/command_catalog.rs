use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionArgType {
    String,
    Boolean,
    Integer,
}

impl FunctionArgType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
        }
    }
}

impl std::fmt::Display for FunctionArgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionArgDef {
    pub name: &'static str,
    pub arg_type: FunctionArgType,
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDef {
    pub function_id: &'static str,
    pub description: &'static str,
    pub args: &'static [FunctionArgDef],
    pub read_only: bool,
}

pub mod function_ids {
    pub const CODE_FILES_LIST: &str = "code_files.list";
    pub const CODE_FILES_READ: &str = "code_files.read";
    pub const CODE_FILES_WRITE: &str = "code_files.write";
    pub const SET_FILES_LIST: &str = "set_files.list";
    pub const SET_FILES_READ: &str = "set_files.read";
    pub const SET_FILES_WRITE: &str = "set_files.write";
    pub const WORKFLOW_FILE_PATCH: &str = "workflow_file.patch";
    pub const RESOURCES_LIST: &str = "resources.list";
    pub const RESOURCES_READ: &str = "resources.read";
    pub const RESOURCES_WRITE: &str = "resources.write";
    pub const RESOURCES_TEMPLATES: &str = "resources.templates";
}

const WORKFLOW_ID_ARG: FunctionArgDef = FunctionArgDef {
    name: "workflowId",
    arg_type: FunctionArgType::String,
    required: true,
    description: "Workflow id",
};

const NODE_ID_ARG: FunctionArgDef = FunctionArgDef {
    name: "nodeId",
    arg_type: FunctionArgType::String,
    required: true,
    description: "Node id (36-character UUID)",
};

const CONTENT_ARG: FunctionArgDef = FunctionArgDef {
    name: "content",
    arg_type: FunctionArgType::String,
    required: true,
    description: "Full replacement content",
};

const EXPECTED_ETAG_ARG: FunctionArgDef = FunctionArgDef {
    name: "expectedEtag",
    arg_type: FunctionArgType::String,
    required: false,
    description: "ETag from the last read; the write fails if the file changed since",
};

const URI_ARG: FunctionArgDef = FunctionArgDef {
    name: "uri",
    arg_type: FunctionArgType::String,
    required: true,
    description: "Resource URI, e.g. n8n-workflows:///code/{workflowId}/{nodeId}.py",
};

const NODE_ARGS: &[FunctionArgDef] = &[WORKFLOW_ID_ARG, NODE_ID_ARG];

const CODE_WRITE_ARGS: &[FunctionArgDef] = &[
    WORKFLOW_ID_ARG,
    NODE_ID_ARG,
    CONTENT_ARG,
    EXPECTED_ETAG_ARG,
    FunctionArgDef {
        name: "language",
        arg_type: FunctionArgType::String,
        required: false,
        description: "Required when creating a new file: python/py or javascript/js/json",
    },
];

const SET_WRITE_ARGS: &[FunctionArgDef] =
    &[WORKFLOW_ID_ARG, NODE_ID_ARG, CONTENT_ARG, EXPECTED_ETAG_ARG];

const PATCH_ARGS: &[FunctionArgDef] = &[
    URI_ARG,
    FunctionArgDef {
        name: "patch",
        arg_type: FunctionArgType::String,
        required: true,
        description: "Unified diff with one or more @@ hunks",
    },
    EXPECTED_ETAG_ARG,
    FunctionArgDef {
        name: "minContextLines",
        arg_type: FunctionArgType::Integer,
        required: false,
        description: "Context lines that must remain after fuzz trimming",
    },
    FunctionArgDef {
        name: "maxFuzz",
        arg_type: FunctionArgType::Integer,
        required: false,
        description: "Context lines that may be trimmed from each hunk edge (0-2)",
    },
    FunctionArgDef {
        name: "ignoreWhitespaceInContext",
        arg_type: FunctionArgType::Boolean,
        required: false,
        description: "Compare context lines with collapsed whitespace",
    },
];

const RESOURCE_WRITE_ARGS: &[FunctionArgDef] = &[
    URI_ARG,
    FunctionArgDef {
        name: "text",
        arg_type: FunctionArgType::String,
        required: true,
        description: "Full replacement text",
    },
    EXPECTED_ETAG_ARG,
];

pub const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        function_id: function_ids::CODE_FILES_LIST,
        description: "List code node files of a workflow",
        args: &[WORKFLOW_ID_ARG],
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::CODE_FILES_READ,
        description: "Read a code node file (.py before .json)",
        args: NODE_ARGS,
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::CODE_FILES_WRITE,
        description: "Write a code node file with optimistic concurrency",
        args: CODE_WRITE_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::SET_FILES_LIST,
        description: "List set node payload files of a workflow",
        args: &[WORKFLOW_ID_ARG],
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::SET_FILES_READ,
        description: "Read a set node payload file",
        args: NODE_ARGS,
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::SET_FILES_WRITE,
        description: "Write a set node payload file with optimistic concurrency",
        args: SET_WRITE_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::WORKFLOW_FILE_PATCH,
        description: "Apply a unified diff to a workflow file",
        args: PATCH_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::RESOURCES_LIST,
        description: "List every workflow file resource, paged",
        args: &[FunctionArgDef {
            name: "cursor",
            arg_type: FunctionArgType::String,
            required: false,
            description: "Cursor returned as nextCursor by a previous page",
        }],
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::RESOURCES_READ,
        description: "Read a workflow file by resource URI",
        args: &[URI_ARG],
        read_only: true,
    },
    FunctionDef {
        function_id: function_ids::RESOURCES_WRITE,
        description: "Write a workflow file by resource URI",
        args: RESOURCE_WRITE_ARGS,
        read_only: false,
    },
    FunctionDef {
        function_id: function_ids::RESOURCES_TEMPLATES,
        description: "List resource URI templates",
        args: &[],
        read_only: true,
    },
];

pub fn function_def(function_id: &str) -> Option<&'static FunctionDef> {
    FUNCTIONS.iter().find(|def| def.function_id == function_id)
}
