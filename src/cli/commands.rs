use crate::request::{RawRequest, UploadedFile};
use crate::route::{compile_routes, CompiledRoute};
use crate::runtime_config::RuntimeConfig;
use crate::spec::{load_spec, ParameterLocation};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use http::Method;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Command-line interface for the parameter validation engine
#[derive(Parser, Debug)]
#[command(name = "brrtrouter-params")]
#[command(about = "Compile and exercise OpenAPI parameter validation", long_about = None)]
pub struct Cli {
    /// YAML runtime configuration; environment variables are used when absent
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile every route and print its pattern and rules
    Routes {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,
    },
    /// Validate one request against the matching route
    ///
    /// Prints the typed parameter tree, or the problem JSON and exits with status 1.
    Check {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request target including the query string, e.g. `/pets/7?tag=cat`
        #[arg(short, long)]
        uri: String,

        /// `Name: value`, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Raw `Cookie` header value
        #[arg(long)]
        cookie: Option<String>,

        /// Request body; `@path` reads it from a file
        #[arg(short, long)]
        body: Option<String>,

        #[arg(long)]
        content_type: Option<String>,

        /// Multipart text field `name=value`, repeatable
        #[arg(long = "form")]
        form: Vec<String>,

        /// Multipart file `name=filename:content-type`, repeatable
        #[arg(long = "file")]
        files: Vec<String>,
    },
}

/// Parse arguments, run the command against stdout and map the outcome to an exit code.
pub fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)?,
        None => RuntimeConfig::from_env(),
    };
    // A second initialization only happens in tests; the first subscriber stays.
    if let Err(err) = crate::telemetry::init_logging_with_config(&config.log) {
        eprintln!("Warning: {err:#}");
    }
    let stdout = std::io::stdout();
    let ok = run(&cli, &config, &mut stdout.lock())?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Execute `cli` writing command output to `out`. `Ok(false)` means the request
/// was rejected or no route matched.
pub fn run(cli: &Cli, config: &RuntimeConfig, out: &mut dyn Write) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Routes { spec } => {
            let routes = compile(spec, config)?;
            for route in &routes {
                print_route(route, out)?;
            }
            Ok(true)
        }
        Commands::Check {
            spec,
            method,
            uri,
            headers,
            cookie,
            body,
            content_type,
            form,
            files,
        } => {
            let routes = compile(spec, config)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method {method}"))?;
            let Some(route) = routes
                .iter()
                .find(|r| r.meta.method == method && r.matches(uri))
            else {
                writeln!(out, "No route matches {method} {uri}")?;
                return Ok(false);
            };

            let mut req = RawRequest::new();
            if let Some((_, query)) = uri.split_once('?') {
                req = req.with_query_string(query);
            }
            for header in headers {
                let (name, value) = header
                    .split_once(':')
                    .ok_or_else(|| anyhow!("header must be `Name: value`, got {header}"))?;
                let name = HeaderName::from_bytes(name.trim().as_bytes())
                    .with_context(|| format!("invalid header name in {header}"))?;
                let value = HeaderValue::from_str(value.trim())
                    .with_context(|| format!("invalid header value in {header}"))?;
                req = req.with_header(name, value);
            }
            if let Some(cookie) = cookie {
                req = req.with_header(COOKIE, HeaderValue::from_str(cookie).context("invalid cookie")?);
            }
            for field in form {
                let (name, value) = field
                    .split_once('=')
                    .ok_or_else(|| anyhow!("form field must be `name=value`, got {field}"))?;
                req = req.with_form_field(name, value);
            }
            for file in files {
                req = req.with_file(parse_file(file)?);
            }
            if let Some(content_type) = content_type {
                let value = HeaderValue::from_str(content_type).context("invalid content type")?;
                let body = match body {
                    Some(body) => read_body(body)?,
                    None => Vec::new(),
                };
                req = req.with_body(value, body);
            } else if let Some(body) = body {
                req = req.with_body(HeaderValue::from_static("application/json"), read_body(body)?);
            } else if !form.is_empty() || !files.is_empty() {
                req = req.with_header(CONTENT_TYPE, HeaderValue::from_static("multipart/form-data"));
            }

            match route.validate(uri, &req) {
                Ok(params) => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&params.to_json())?)?;
                    Ok(true)
                }
                Err(err) => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&err.to_problem_json())?)?;
                    Ok(false)
                }
            }
        }
    }
}

fn compile(spec: &Path, config: &RuntimeConfig) -> anyhow::Result<Vec<CompiledRoute>> {
    let (routes, _slug) = load_spec(spec)?;
    compile_routes(&routes, &config.validator)
        .with_context(|| format!("failed to compile routes of {}", spec.display()))
}

fn print_route(route: &CompiledRoute, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{} -> {}", route.label(), route.meta.handler_name)?;
    writeln!(out, "  pattern: {}", route.pattern.as_str())?;
    for location in [
        ParameterLocation::Path,
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Cookie,
    ] {
        let rules = route.validator.rules(location);
        if rules.is_empty() {
            continue;
        }
        let names: Vec<String> = rules
            .iter()
            .map(|r| {
                if r.required {
                    format!("{}*", r.parameter)
                } else {
                    r.parameter.clone()
                }
            })
            .collect();
        writeln!(out, "  {location}: {}", names.join(", "))?;
    }
    if let Some(body) = route.validator.body() {
        let marker = if body.required { " (required)" } else { "" };
        writeln!(out, "  body{marker}: {}", body.declared())?;
    }
    Ok(())
}

fn read_body(body: &str) -> anyhow::Result<Vec<u8>> {
    match body.strip_prefix('@') {
        Some(path) => std::fs::read(path).with_context(|| format!("failed to read body file {path}")),
        None => Ok(body.as_bytes().to_vec()),
    }
}

/// `name=filename:content-type`; the content type defaults to `application/octet-stream`.
fn parse_file(spec: &str) -> anyhow::Result<UploadedFile> {
    let (name, rest) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("file must be `name=filename:content-type`, got {spec}"))?;
    let (filename, content_type) = rest
        .split_once(':')
        .unwrap_or((rest, "application/octet-stream"));
    Ok(UploadedFile::new(name, filename, content_type))
}
