use std::path::PathBuf;

use swc_core::common::comments::SingleThreadedComments;
use swc_core::common::sync::Lrc;
use swc_core::common::{Globals, SourceMap};

pub struct Context {
    pub root: PathBuf,
    pub meta: Meta,
}

impl Context {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            meta: Meta::new(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

pub struct Meta {
    pub script: ScriptMeta,
}

impl Meta {
    pub fn new() -> Self {
        Self {
            script: ScriptMeta::new(),
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ScriptMeta {
    pub cm: Lrc<SourceMap>,
    pub globals: Globals,
    // kept across parse and codegen so comments survive the rewrite
    pub origin_comments: SingleThreadedComments,
}

impl ScriptMeta {
    fn new() -> Self {
        Self {
            cm: Default::default(),
            globals: Globals::new(),
            origin_comments: Default::default(),
        }
    }
}
