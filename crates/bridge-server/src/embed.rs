use rust_embed::Embed;

#[derive(Embed)]
#[folder = "templates/"]
struct BuiltinTemplates;

/// Built-in bootstrap template by identifier, e.g. `bridge/bootstrap.html`.
pub fn builtin_template(name: &str) -> Option<String> {
    <BuiltinTemplates as Embed>::get(name)
        .map(|file| String::from_utf8_lossy(&file.data).into_owned())
}
