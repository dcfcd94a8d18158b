//! Rendering a scope's variables into an MSBuild property sheet.
//!
//! For each variable the sheet carries a user macro, a `BuildMacro` item
//! exporting it to the build environment, and, for defines, an entry in a
//! single `PreprocessorDefinitions` list:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <Project ToolsVersion="Current" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
//!   <PropertyGroup Label="UserMacros">
//!     <LOG_LEVEL>3</LOG_LEVEL>
//!   </PropertyGroup>
//!   <ItemGroup>
//!     <BuildMacro Include="LOG_LEVEL">
//!       <Value>$(LOG_LEVEL)</Value>
//!       <EnvironmentVariable>true</EnvironmentVariable>
//!     </BuildMacro>
//!   </ItemGroup>
//!   <ItemDefinitionGroup Condition="'$(VCProjectVersion)' != ''">
//!     <ClCompile>
//!       <PreprocessorDefinitions>LOG_LEVEL=$(LOG_LEVEL);%(PreprocessorDefinitions)</PreprocessorDefinitions>
//!     </ClCompile>
//!   </ItemDefinitionGroup>
//! </Project>
//! ```
//!
//! Output depends only on the variables, so rendering an unchanged
//! selection twice yields identical bytes.

use std::fmt::Write;

use crate::consts::{MSBUILD_NS, VC_PROJECT_CONDITION};
use crate::profile::{ProfileStore, ScopeKey, Variable};

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// Render the sheet for `scope`: shared variables, then the target's.
///
/// The shared scope renders the shared variables alone. Unknown targets
/// render as if they had no variables of their own.
pub fn render(store: &ProfileStore, scope: &ScopeKey) -> String {
  let shared = store.current_variables(&ScopeKey::Shared);
  let own = match scope {
    ScopeKey::Shared => &[][..],
    ScopeKey::Target(_) => store.current_variables(scope),
  };
  render_variables(shared.iter().chain(own))
}

/// Render an ordered sequence of variables. Duplicates are kept in order.
pub fn render_variables<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> String {
  let mut macros = String::new();
  let mut exports = String::new();
  let mut definitions = String::new();

  for var in variables {
    let value = unquote(&var.value);
    let _ = writeln!(macros, "    <{name}>{}</{name}>", escape(value), name = var.name);
    let _ = writeln!(exports, "    <BuildMacro Include=\"{}\">", var.name);
    let _ = writeln!(exports, "      <Value>$({})</Value>", var.name);
    exports.push_str("      <EnvironmentVariable>true</EnvironmentVariable>\n");
    exports.push_str("    </BuildMacro>\n");

    if var.is_define {
      let _ = write!(definitions, "{}=$({});", macro_case(&var.name), var.name);
    }
  }

  let mut out = String::from(XML_DECL);
  let _ = writeln!(out, "<Project ToolsVersion=\"Current\" xmlns=\"{}\">", MSBUILD_NS);
  out.push_str("  <PropertyGroup Label=\"UserMacros\">\n");
  out.push_str(&macros);
  out.push_str("  </PropertyGroup>\n");
  out.push_str("  <ItemGroup>\n");
  out.push_str(&exports);
  out.push_str("  </ItemGroup>\n");

  if !definitions.is_empty() {
    let _ = writeln!(
      out,
      "  <ItemDefinitionGroup Condition=\"{}\">",
      escape(VC_PROJECT_CONDITION)
    );
    out.push_str("    <ClCompile>\n");
    let _ = writeln!(
      out,
      "      <PreprocessorDefinitions>{}%(PreprocessorDefinitions)</PreprocessorDefinitions>",
      escape(&definitions)
    );
    out.push_str("    </ClCompile>\n");
    out.push_str("  </ItemDefinitionGroup>\n");
  }

  out.push_str("</Project>\n");
  out
}

/// Render the stable stub that imports the artifact `file_name` (XML-escaped)
/// from the stub's own directory.
pub fn render_stub(file_name: &str) -> String {
  let mut out = String::from(XML_DECL);
  let _ = writeln!(out, "<Project ToolsVersion=\"Current\" xmlns=\"{}\">", MSBUILD_NS);
  out.push_str("  <ImportGroup Label=\"PropertySheets\">\n");
  let _ = writeln!(
    out,
    "    <Import Project=\"$(MSBuildThisFileDirectory){file_name}\" />"
  );
  out.push_str("  </ImportGroup>\n");
  out.push_str("</Project>\n");
  out
}

/// Strip one layer of `"..."` quotes, or the `R"(` / `)"` raw-string markers.
pub fn unquote(value: &str) -> &str {
  if value.len() >= 5
    && let Some(inner) = value.strip_prefix("R\"(").and_then(|v| v.strip_suffix(")\""))
  {
    return inner;
  }
  if value.len() >= 2
    && let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"'))
  {
    return inner;
  }
  value
}

/// Convert a camelCase name to MACRO_CASE.
///
/// Two passes, applied literally:
/// 1. `_` before every uppercase letter that follows a lowercase letter or digit
/// 2. scanning left to right without overlap, `_` between the two uppercase
///    letters of every uppercase-uppercase-lowercase triple
///
/// then everything is uppercased. `fooBarID` → `FOO_BAR_ID`, `URLPath` → `URL_PATH`.
pub fn macro_case(name: &str) -> String {
  let chars: Vec<char> = name.chars().collect();

  let mut first = Vec::with_capacity(chars.len() + 4);
  for (i, &c) in chars.iter().enumerate() {
    if c.is_ascii_uppercase() && i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit()) {
      first.push('_');
    }
    first.push(c);
  }

  let mut second = String::with_capacity(first.len() + 4);
  let mut i = 0;
  while i < first.len() {
    if i + 2 < first.len()
      && first[i].is_ascii_uppercase()
      && first[i + 1].is_ascii_uppercase()
      && first[i + 2].is_ascii_lowercase()
    {
      second.push(first[i]);
      second.push('_');
      second.push(first[i + 1]);
      second.push(first[i + 2]);
      i += 3;
    } else {
      second.push(first[i]);
      i += 1;
    }
  }

  second.to_uppercase()
}

/// Encode the characters MSBuild gives meaning to inside a path as `%XX`.
///
/// `'` would also end a quoted string inside a `Condition`.
pub fn msbuild_escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '%' | '\'' | ';' | '$' | '@' => {
        let _ = write!(out, "%{:02X}", c as u32);
      }
      _ => out.push(c),
    }
  }
  out
}

/// Escape text for XML element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      _ => out.push(c),
    }
  }
  out
}
