//! Texture path utilities

/// Normalize a texture path as written in a scene
/// - Converts backslashes to forward slashes
/// - Removes redundant separators and `.` components
/// - Resolves `..` against preceding named components
/// - Keeps a leading `/` and relative paths relative
pub fn normalize_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let absolute = path.starts_with('/');

    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => match components.last() {
                Some(last) if *last != ".." => {
                    components.pop();
                }
                _ if absolute => {}
                _ => components.push(".."),
            },
            _ => components.push(component),
        }
    }

    let joined = components.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// File name without directories or extension
pub fn file_stem(path: &str) -> &str {
    let name = path
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path);

    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}
