//! Host glue for the generated Java program.
//!
//! Each stage becomes a block that checks its inputs exist (returning early
//! otherwise), marks the script executable, runs it with the positional
//! arguments of [`crate::contract`] and, for predict stages, decodes stdout
//! line by line into the declared result variables. A missing line leaves
//! its variable untouched.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;

use crate::catalog::GenerationPlan;
use crate::contract::{self, Arg};
use crate::error::Result;
use crate::layout::{ScriptLayout, Stage};
use crate::model::{Feature, NativeType};
use crate::render::{Dialect, quote};

/// Joins an array field into the `'[v1 v2]'` argument form.
const JOIN_ARRAY_HELPER: &str = "\
private static String ml2JoinArray(Object array) {
    StringBuilder out = new StringBuilder(\"'[\");
    for (int i = 0; i < java.lang.reflect.Array.getLength(array); i++) {
        if (i > 0) {
            out.append(' ');
        }
        out.append(java.lang.reflect.Array.get(array, i));
    }
    return out.append(\"]'\").toString();
}";

/// Splits an array result line into its items.
const SPLIT_ARRAY_HELPER: &str = "\
private static String[] ml2SplitArray(String line) {
    String body = line.trim().replaceAll(\"^\\\\[|\\\\]$\", \"\").trim();
    return body.isEmpty() ? new String[0] : body.split(\"\\\\s+\");
}";

/// Java source for one stage, ready to splice into a host method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostFragment {
    pub stage: Stage,
    /// Import declarations the body relies on.
    pub imports: BTreeSet<String>,
    /// Class-level helper methods.
    pub helpers: Vec<String>,
    /// Method body statements.
    pub body: String,
}

impl HostFragment {
    /// The fragment as a standalone listing: imports, helpers, body.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for import in &self.imports {
            let _ = writeln!(out, "import {import};");
        }
        for helper in &self.helpers {
            let _ = writeln!(out, "\n{helper}");
        }
        let _ = write!(out, "\n{}", self.body);
        out
    }
}

/// Java identifier for a spec name.
fn identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn java_str(value: &str) -> String {
    quote(value, Dialect::Java)
}

/// Java expression turning a stdout line into a value of `ty`.
fn decode_scalar(ty: NativeType, text: &str) -> String {
    match ty {
        NativeType::Boolean => format!("Boolean.parseBoolean({text})"),
        NativeType::Char => format!("{text}.charAt(0)"),
        NativeType::Byte | NativeType::Short | NativeType::Int | NativeType::Long => {
            // Integral results may print as floats (`3.0`); `3.7` throws.
            format!(
                "({}) new java.math.BigDecimal({text}).longValueExact()",
                ty.java_type()
            )
        }
        NativeType::Float => format!("Float.parseFloat({text})"),
        NativeType::Double => format!("Double.parseDouble({text})"),
        NativeType::String => text.to_string(),
    }
}

fn decode_result(result: &Feature, helpers: &mut Vec<String>) -> String {
    let target = identifier(&result.name);
    if !result.is_array {
        let guard = if result.ty == NativeType::Char {
            "line != null && !line.trim().isEmpty()"
        } else {
            "line != null"
        };
        return format!(
            "line = reader.readLine();\nif ({guard}) {{\n    {target} = {};\n}}",
            decode_scalar(result.ty, "line.trim()")
        );
    }
    if !helpers.iter().any(|h| h == SPLIT_ARRAY_HELPER) {
        helpers.push(SPLIT_ARRAY_HELPER.to_string());
    }
    format!(
        "line = reader.readLine();\n\
         if (line != null) {{\n    \
         String[] parts = ml2SplitArray(line);\n    \
         {target} = new {ty}[parts.length];\n    \
         for (int i = 0; i < parts.length; i++) {{\n        \
         {target}[i] = {value};\n    \
         }}\n\
         }}",
        ty = result.ty.java_type(),
        value = decode_scalar(result.ty, "parts[i]"),
    )
}

/// Emit the host glue running `stage` of `plan`, with paths as the host
/// sees them in `layout`.
pub fn emit_glue(plan: &GenerationPlan, layout: &ScriptLayout, stage: Stage) -> Result<HostFragment> {
    let invocation = contract::invocation(plan, layout, stage)?;
    let spec = &plan.spec;
    let mut imports: BTreeSet<String> = ["java.io.File", "java.io.IOException", "java.util.ArrayList", "java.util.List"]
        .into_iter()
        .map(String::from)
        .collect();
    let mut helpers = Vec::new();
    let mut body = format!(
        "// {} stage of {}, generated by ml2-codegen\n",
        stage,
        spec.name
    );

    for path in &invocation.required {
        let _ = writeln!(
            body,
            "if (!new File({}).exists()) {{\n    return;\n}}",
            java_str(&path.to_string_lossy())
        );
    }
    let _ = writeln!(
        body,
        "File script = new File({});\nscript.setExecutable(true);",
        java_str(&invocation.script.to_string_lossy())
    );

    body.push_str("List<String> command = new ArrayList<>();\ncommand.add(script.getPath());\n");
    for arg in &invocation.args {
        let expression = match arg {
            Arg::Constant(value) => java_str(value),
            Arg::Feature(index) => {
                let feature = &spec.features[*index];
                let name = identifier(&feature.name);
                if feature.is_array {
                    if !helpers.iter().any(|h| h == JOIN_ARRAY_HELPER) {
                        helpers.push(JOIN_ARRAY_HELPER.to_string());
                    }
                    format!("ml2JoinArray({name})")
                } else {
                    format!("String.valueOf({name})")
                }
            }
            Arg::Timestamp => "String.valueOf(System.currentTimeMillis() / 1000L)".to_string(),
        };
        let _ = writeln!(body, "command.add({expression});");
    }

    body.push_str(
        "try {\n    ProcessBuilder builder = new ProcessBuilder(command);\n    \
         builder.redirectError(ProcessBuilder.Redirect.INHERIT);\n",
    );
    if invocation.results.is_empty() {
        body.push_str(
            "    builder.redirectOutput(ProcessBuilder.Redirect.INHERIT);\n    \
             Process process = builder.start();\n",
        );
    } else {
        imports.insert("java.io.BufferedReader".to_string());
        imports.insert("java.io.InputStreamReader".to_string());
        let decoders = invocation
            .results
            .iter()
            .map(|result| decode_result(result, &mut helpers))
            .collect::<Vec<_>>()
            .join("\n");
        let _ = writeln!(
            body,
            "    Process process = builder.start();\n    \
             try (BufferedReader reader = new BufferedReader(new InputStreamReader(process.getInputStream()))) {{\n        \
             String line;\n{}\n    }}",
            crate::template::indent(&decoders, 2)
        );
    }
    body.push_str(
        "    process.waitFor();\n} catch (IOException | InterruptedException e) {\n    \
         e.printStackTrace();\n}\n",
    );

    tracing::debug!(stage = %stage, "Emitted host glue");
    Ok(HostFragment {
        stage,
        imports,
        helpers,
        body,
    })
}
