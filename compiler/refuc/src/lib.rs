//! The refu compiler driver.
//!
//! Orchestrates the four-stage pipeline over a set of modules:
//! dependency discovery, first pass, typecheck, and finalization plus
//! RIR lowering. Modules are processed in topological order; lowering of
//! distinct finalized modules runs in parallel. Diagnostics collect per
//! module and flush at the end; the exit code distinguishes clean runs,
//! source errors, and driver failures.

mod error;
mod stdlib;

use std::path::PathBuf;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use refu_analysis::{
    analyze_module, collect_imports, finalize, topological_sort, Analyzer, CancelFlag, Module,
    ModuleId,
};
use refu_diagnostic::{emitter, DiagnosticQueue};
use refu_ir::{Ast, NodeId};
use refu_rir::RirModule;

pub use error::DriverError;
pub use stdlib::{STDLIB_MODULE_NAME, STDLIB_SOURCE};

/// Driver configuration.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Print each module's RIR text after lowering.
    pub print_rir: bool,
    /// Emit warnings for implicit conversions.
    pub warn_implicit_conversions: bool,
    /// Treat a "success, continue" outcome of the serialize stage like
    /// "success, exit": skip the verification stage as well.
    pub stop_after_serialize_continue: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            print_rir: false,
            warn_implicit_conversions: true,
            stop_after_serialize_continue: false,
        }
    }
}

/// What the pipeline concluded.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Success,
    /// Syntax or semantic errors were collected; no RIR was built.
    SourceErrors,
}

impl Outcome {
    /// The process exit code this outcome maps to. Driver errors exit 2.
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::SourceErrors => 1,
        }
    }
}

/// Result of the serialize (RIR printing) stage.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum SerializeRc {
    SuccessExit,
    SuccessContinue,
}

/// The compiler: owned modules, their lowered RIR, and pipeline state.
pub struct Compiler {
    modules: Vec<Module>,
    rirs: Vec<Option<RirModule>>,
    names: FxHashMap<String, ModuleId>,
    /// Directory imports are resolved against, when compiling from disk.
    source_dir: Option<PathBuf>,
    order: Vec<ModuleId>,
    cancel: CancelFlag,
    options: CompileOptions,
    discovered: bool,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            modules: Vec::new(),
            rirs: Vec::new(),
            names: FxHashMap::default(),
            source_dir: None,
            order: Vec::new(),
            cancel: CancelFlag::new(),
            options,
            discovered: false,
        }
    }

    /// The shared cancellation flag; the analyzer polls it at function
    /// boundaries.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Register a module from in-memory source. The first module added
    /// is the root.
    pub fn add_module_source(&mut self, name: &str, file: &str, src: &str) -> ModuleId {
        let mut analyzer = Analyzer::new();
        analyzer.warn_on_implicit_conversions = self.options.warn_implicit_conversions;
        let mut diags = DiagnosticQueue::new();
        let tokens =
            refu_lexer::lex(src, &mut analyzer.idents, &mut analyzer.literals, &mut diags);
        let (ast, root) = refu_parse::parse_module(name, &tokens, &mut analyzer.idents, &mut diags);
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module {
            name: name.to_string(),
            file: file.to_string(),
            src: src.to_string(),
            ast,
            root,
            analyzer,
            deps: Vec::new(),
            diags,
            sorted_index: None,
        });
        self.rirs.push(None);
        self.names.insert(name.to_string(), id);
        debug!(module = name, "registered module");
        id
    }

    /// Register the root module from a file; its directory becomes the
    /// import search path.
    pub fn add_root_file(&mut self, path: &str) -> Result<ModuleId, DriverError> {
        let p = PathBuf::from(path);
        let src = std::fs::read_to_string(&p).map_err(|source| DriverError::Io {
            path: path.to_string(),
            source,
        })?;
        let name = p
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string());
        self.source_dir = p.parent().map(PathBuf::from);
        Ok(self.add_module_source(&name, path, &src))
    }

    fn load_module_file(&mut self, importer: &str, name: &str) -> Result<ModuleId, DriverError> {
        let Some(dir) = self.source_dir.clone() else {
            return Err(DriverError::ModuleNotFound {
                importer: importer.to_string(),
                name: name.to_string(),
            });
        };
        let path = dir.join(format!("{name}.rf"));
        if !path.exists() {
            return Err(DriverError::ModuleNotFound {
                importer: importer.to_string(),
                name: name.to_string(),
            });
        }
        let display = path.to_string_lossy().into_owned();
        let src = std::fs::read_to_string(&path).map_err(|source| DriverError::Io {
            path: display.clone(),
            source,
        })?;
        Ok(self.add_module_source(name, &display, &src))
    }

    /// Walk every module's import list and wire the dependency edges.
    /// Non-foreign imports resolve to already-registered modules or to
    /// `<name>.rf` next to the root file; the root module additionally
    /// depends on the standard library.
    pub fn discover_dependencies(&mut self) -> Result<(), DriverError> {
        if self.discovered || self.modules.is_empty() {
            self.discovered = true;
            return Ok(());
        }

        let mut i = 0;
        while i < self.modules.len() {
            let imports = collect_imports(&self.modules[i].ast, self.modules[i].root);
            for (name_id, foreign) in imports {
                if foreign {
                    continue;
                }
                let name = self.modules[i]
                    .analyzer
                    .idents
                    .get(name_id)
                    .unwrap_or("")
                    .to_string();
                let dep = match self.names.get(&name) {
                    Some(&id) => id,
                    None => {
                        let importer = self.modules[i].name.clone();
                        self.load_module_file(&importer, &name)?
                    }
                };
                if !self.modules[i].deps.contains(&dep) {
                    self.modules[i].deps.push(dep);
                }
            }
            i += 1;
        }

        // the root module gets the standard library implicitly
        let stdlib = match self.names.get(STDLIB_MODULE_NAME) {
            Some(&id) => id,
            None => self.add_module_source(STDLIB_MODULE_NAME, "<stdlib>", STDLIB_SOURCE),
        };
        let root = ModuleId(0);
        if root != stdlib && !self.modules[root.index()].deps.contains(&stdlib) {
            self.modules[root.index()].deps.push(stdlib);
        }

        self.discovered = true;
        Ok(())
    }

    /// Run the whole pipeline. Source errors are not `Err`: they land in
    /// the diagnostic queues and produce [`Outcome::SourceErrors`].
    pub fn run(&mut self) -> Result<Outcome, DriverError> {
        self.discover_dependencies()?;

        let deps: Vec<Vec<ModuleId>> = self.modules.iter().map(|m| m.deps.clone()).collect();
        let order = topological_sort(&deps)?;
        for (pos, id) in order.iter().enumerate() {
            self.modules[id.index()].sorted_index = Some(pos);
        }
        self.order = order;

        // analysis and finalization, dependencies first
        for pos in 0..self.order.len() {
            let id = self.order[pos];
            self.analyze_at(id)?;
            self.finalize_at(id);
        }

        if self.has_source_errors() {
            return Ok(Outcome::SourceErrors);
        }

        // a genuinely empty root (not one emptied by syntax errors) is a
        // driver error
        if let Some(root) = self.modules.first() {
            if root.is_empty() {
                return Err(DriverError::EmptyModule(root.name.clone()));
            }
        }

        // distinct finalized modules lower in parallel
        let results: Vec<Result<RirModule, refu_rir::RirError>> =
            self.modules.par_iter_mut().map(refu_rir::build).collect();
        for (i, result) in results.into_iter().enumerate() {
            let mut rir = result?;
            rir.deps = self.modules[i]
                .deps
                .iter()
                .map(|d| self.modules[d.index()].name.clone())
                .collect();
            self.rirs[i] = Some(rir);
        }
        info!(modules = self.modules.len(), "lowering complete");

        let rc = self.serialize();
        let stop = match rc {
            SerializeRc::SuccessExit => true,
            SerializeRc::SuccessContinue => self.options.stop_after_serialize_continue,
        };
        if !stop {
            self.verify_all()?;
        }
        Ok(Outcome::Success)
    }

    /// Analyze one module with its dependencies' analyzers in view.
    /// Dependencies are already analyzed: the pipeline runs in
    /// topological order.
    fn analyze_at(&mut self, id: ModuleId) -> Result<(), DriverError> {
        let mut m = std::mem::replace(&mut self.modules[id.index()], placeholder_module());
        let result = {
            let dep_analyzers: Vec<&Analyzer> = m
                .deps
                .iter()
                .map(|d| &self.modules[d.index()].analyzer)
                .collect();
            analyze_module(&mut m, &dep_analyzers, &self.cancel)
        };
        self.modules[id.index()] = m;
        result.map_err(DriverError::from)
    }

    /// Merge dependency type sets into one module and finish its AST.
    fn finalize_at(&mut self, id: ModuleId) {
        let mut m = std::mem::replace(&mut self.modules[id.index()], placeholder_module());
        {
            let dep_sets: Vec<&refu_types::TypeSet> = m
                .deps
                .iter()
                .map(|d| &self.modules[d.index()].analyzer.types)
                .collect();
            finalize(&mut m, &dep_sets);
        }
        self.modules[id.index()] = m;
    }

    /// Print each module's RIR in topological order.
    fn serialize(&mut self) -> SerializeRc {
        if !self.options.print_rir {
            return SerializeRc::SuccessContinue;
        }
        for &id in &self.order {
            if let Some(rir) = self.rirs[id.index()].as_mut() {
                print!("{}", rir.to_text());
            }
        }
        SerializeRc::SuccessExit
    }

    /// Check block well-formedness of every lowered function: exactly
    /// one terminator per block, nothing after it.
    fn verify_all(&self) -> Result<(), DriverError> {
        for (i, rir) in self.rirs.iter().enumerate() {
            let Some(rir) = rir else { continue };
            for f in &rir.functions {
                for block in &f.blocks {
                    if block.terminator.is_none() {
                        return Err(DriverError::Verification {
                            module: self.modules[i].name.clone(),
                            reason: format!(
                                "block L{} of function '{}' has no terminator",
                                block.label, f.name
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn has_source_errors(&self) -> bool {
        self.modules.iter().any(|m| m.diags.has_errors())
    }

    /// Render every module's diagnostics as source-annotated text, in
    /// registration order.
    pub fn flush_diagnostics(&self) -> String {
        let mut out = String::new();
        for m in &self.modules {
            out.push_str(&emitter::render_all(m.diags.messages(), &m.file, &m.src));
        }
        out
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn rir(&self, id: ModuleId) -> Option<&RirModule> {
        self.rirs[id.index()].as_ref()
    }

    /// The lowered RIR text of one module.
    pub fn rir_text(&mut self, id: ModuleId) -> Option<&str> {
        self.rirs[id.index()].as_mut().map(|r| r.to_text())
    }

    /// Modules in topological order; empty before `run`.
    pub fn sorted_order(&self) -> &[ModuleId] {
        &self.order
    }
}

/// Inert stand-in while a module is temporarily taken out of the list.
fn placeholder_module() -> Module {
    let mut ast = Ast::new();
    let root: NodeId = ast.add(refu_ir::AstKind::Block, refu_ir::Span::DUMMY, Vec::new());
    Module {
        name: String::new(),
        file: String::new(),
        src: String::new(),
        ast,
        root,
        analyzer: Analyzer::new(),
        deps: Vec::new(),
        diags: DiagnosticQueue::new(),
        sorted_index: None,
    }
}
