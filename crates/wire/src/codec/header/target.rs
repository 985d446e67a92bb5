//! Splitting of a request target into path, path info and query arguments.

use crate::codec::helpers::decode_url;

/// Script extensions after which the rest of the path is handed to the script as path info.
const SCRIPT_EXTENSIONS: [&str; 2] = [".php", ".hgs"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RequestTarget {
    pub(crate) path: String,
    pub(crate) path_info: String,
    pub(crate) args: String,
}

impl RequestTarget {
    /// Splits `target` at the first `?`. The query stays encoded, the path and the path
    /// info are percent-decoded and stripped of every `../`.
    pub(crate) fn parse(target: &str) -> Self {
        let (path, args) = target.split_once('?').unwrap_or((target, ""));
        let path = strip_parent_segments(decode_url(path));

        let (path, path_info) = match split_script_path(&path) {
            Some(at) => (path[..at].to_string(), path[at..].to_string()),
            None => (path, String::new()),
        };

        Self { path, path_info, args: args.to_string() }
    }
}

/// Byte offset of the `/` following the first script segment, if any.
fn split_script_path(path: &str) -> Option<usize> {
    SCRIPT_EXTENSIONS
        .iter()
        .filter_map(|extension| path.find(&format!("{extension}/")).map(|at| at + extension.len()))
        .min()
}

fn strip_parent_segments(mut path: String) -> String {
    // removing one occurrence may form another, e.g. `....//`
    while let Some(at) = path.find("../") {
        path.replace_range(at..at + 3, "");
    }
    path
}
