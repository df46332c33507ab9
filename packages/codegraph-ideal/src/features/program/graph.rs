/*
 * Program Graph
 *
 * Small in-memory program: methods with optional bodies, each body a list
 * of statements addressed as "method:index".
 *
 * # Control flow
 * - fall-through to index + 1
 * - `Goto { target }` jumps, `IfNull { target }` branches (both successors)
 * - `Return` has no successors
 *
 * # Example
 * ```ignore
 * let mut builder = ProgramBuilder::new();
 * builder
 *     .method("main")
 *     .stmt(StmtKind::new_object("f", "File"))
 *     .stmt(StmtKind::call_method("f", "File.open"));
 * builder.library_method("File.open");
 * builder.entry("main");
 * let program = builder.build()?;
 * ```
 *
 * `build()` appends a `Return` to bodies that would otherwise fall off
 * their end, then validates branch targets, call targets and arity.
 */

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ProgramError;

/// Statement kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StmtKind {
    Nop,

    /// `var = new class()`
    New { var: String, class: String },

    /// `to = from`
    Assign { to: String, from: String },

    /// `to = base.field`
    Load {
        to: String,
        base: String,
        field: String,
    },

    /// `base.field = from`
    Store {
        base: String,
        field: String,
        from: String,
    },

    /// `result = receiver.callee(args)`; several callees model dynamic dispatch
    Invoke {
        receiver: Option<String>,
        callees: Vec<String>,
        args: Vec<String>,
        result: Option<String>,
    },

    /// `if (var == null) goto target`
    IfNull { var: String, target: usize },

    Goto { target: usize },

    Return { value: Option<String> },
}

impl StmtKind {
    pub fn nop() -> Self {
        StmtKind::Nop
    }

    pub fn new_object(var: &str, class: &str) -> Self {
        StmtKind::New {
            var: var.to_string(),
            class: class.to_string(),
        }
    }

    pub fn assign(to: &str, from: &str) -> Self {
        StmtKind::Assign {
            to: to.to_string(),
            from: from.to_string(),
        }
    }

    pub fn load(to: &str, base: &str, field: &str) -> Self {
        StmtKind::Load {
            to: to.to_string(),
            base: base.to_string(),
            field: field.to_string(),
        }
    }

    pub fn store(base: &str, field: &str, from: &str) -> Self {
        StmtKind::Store {
            base: base.to_string(),
            field: field.to_string(),
            from: from.to_string(),
        }
    }

    /// `receiver.callee()`
    pub fn call_method(receiver: &str, callee: &str) -> Self {
        Self::invoke(Some(receiver), &[callee], &[], None)
    }

    /// `callee(args)` without a receiver
    pub fn call_static(callee: &str, args: &[&str]) -> Self {
        Self::invoke(None, &[callee], args, None)
    }

    pub fn invoke(
        receiver: Option<&str>,
        callees: &[&str],
        args: &[&str],
        result: Option<&str>,
    ) -> Self {
        StmtKind::Invoke {
            receiver: receiver.map(str::to_string),
            callees: callees.iter().map(|c| c.to_string()).collect(),
            args: args.iter().map(|a| a.to_string()).collect(),
            result: result.map(str::to_string),
        }
    }

    pub fn if_null(var: &str, target: usize) -> Self {
        StmtKind::IfNull {
            var: var.to_string(),
            target,
        }
    }

    pub fn goto(target: usize) -> Self {
        StmtKind::Goto { target }
    }

    pub fn ret(value: Option<&str>) -> Self {
        StmtKind::Return {
            value: value.map(str::to_string),
        }
    }

    pub fn is_invoke(&self) -> bool {
        matches!(self, StmtKind::Invoke { .. })
    }

    pub fn is_return(&self) -> bool {
        matches!(self, StmtKind::Return { .. })
    }

    /// Local overwritten by this statement
    pub fn defined_local(&self) -> Option<&str> {
        match self {
            StmtKind::New { var, .. } => Some(var),
            StmtKind::Assign { to, .. } | StmtKind::Load { to, .. } => Some(to),
            StmtKind::Invoke { result, .. } => result.as_deref(),
            _ => None,
        }
    }
}

/// Method declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<String>,

    /// Receives a receiver bound to the local `this`
    pub is_instance: bool,

    /// Application (non-library) code
    pub application: bool,

    /// `None` for methods without a body
    pub body: Option<Vec<StmtKind>>,
}

impl MethodDecl {
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Simple name: the part after the last `.`
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// Part of a method name after the last `.`
pub fn simple_name(method: &str) -> &str {
    method.rsplit('.').next().unwrap_or(method)
}

/// Node id of statement `index` in `method`
pub fn node_id(method: &str, index: usize) -> String {
    format!("{}:{}", method, index)
}

// ============================================================================
// Builder
// ============================================================================

/// Accumulates one method declaration
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    decl: MethodDecl,
}

impl MethodBuilder {
    pub fn param(&mut self, name: &str) -> &mut Self {
        self.decl.params.push(name.to_string());
        self
    }

    /// Receiver available as `this`
    pub fn instance(&mut self) -> &mut Self {
        self.decl.is_instance = true;
        self
    }

    /// Mark as library code (keeps the body)
    pub fn library(&mut self) -> &mut Self {
        self.decl.application = false;
        self
    }

    /// Append a statement. Gives body-less methods a body.
    pub fn stmt(&mut self, kind: StmtKind) -> &mut Self {
        self.decl.body.get_or_insert_with(Vec::new).push(kind);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    methods: Vec<MethodBuilder>,
    entries: Vec<String>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an application method with a body
    pub fn method(&mut self, name: &str) -> &mut MethodBuilder {
        self.push(MethodDecl {
            name: name.to_string(),
            params: Vec::new(),
            is_instance: false,
            application: true,
            body: Some(Vec::new()),
        })
    }

    /// Declare a library method without a body
    pub fn library_method(&mut self, name: &str) -> &mut MethodBuilder {
        self.push(MethodDecl {
            name: name.to_string(),
            params: Vec::new(),
            is_instance: true,
            application: false,
            body: None,
        })
    }

    /// Reachability root. Without entries every declared method is reachable.
    pub fn entry(&mut self, name: &str) -> &mut Self {
        self.entries.push(name.to_string());
        self
    }

    fn push(&mut self, decl: MethodDecl) -> &mut MethodBuilder {
        let index = self.methods.len();
        self.methods.push(MethodBuilder { decl });
        &mut self.methods[index]
    }

    pub fn build(self) -> Result<ProgramGraph, ProgramError> {
        let mut methods: FxHashMap<String, MethodDecl> = FxHashMap::default();
        let mut order = Vec::with_capacity(self.methods.len());

        for builder in self.methods {
            let mut decl = builder.decl;
            if let Some(body) = decl.body.as_mut() {
                let falls_off = !matches!(
                    body.last(),
                    Some(StmtKind::Return { .. }) | Some(StmtKind::Goto { .. })
                );
                if falls_off {
                    body.push(StmtKind::ret(None));
                }
            }
            if methods.contains_key(&decl.name) {
                return Err(ProgramError::DuplicateMethod(decl.name));
            }
            order.push(decl.name.clone());
            methods.insert(decl.name.clone(), decl);
        }

        for entry in &self.entries {
            if !methods.contains_key(entry) {
                return Err(ProgramError::UnknownEntry(entry.clone()));
            }
        }

        ProgramGraph::index(methods, order, self.entries)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Validated program with precomputed successor, predecessor and caller tables
#[derive(Debug, Clone)]
pub struct ProgramGraph {
    methods: FxHashMap<String, MethodDecl>,
    order: Vec<String>,
    locations: FxHashMap<String, (String, usize)>,
    successors: FxHashMap<String, Vec<String>>,
    predecessors: FxHashMap<String, Vec<String>>,
    callers: FxHashMap<String, Vec<String>>,
    reachable: Vec<String>,
}

impl ProgramGraph {
    fn index(
        methods: FxHashMap<String, MethodDecl>,
        order: Vec<String>,
        entries: Vec<String>,
    ) -> Result<Self, ProgramError> {
        let mut locations = FxHashMap::default();
        let mut successors: FxHashMap<String, Vec<String>> = FxHashMap::default();
        let mut predecessors: FxHashMap<String, Vec<String>> = FxHashMap::default();
        let mut callers: FxHashMap<String, Vec<String>> = FxHashMap::default();

        for name in &order {
            let Some(body) = methods.get(name).and_then(|m| m.body.as_ref()) else {
                continue;
            };
            let len = body.len();

            for (index, stmt) in body.iter().enumerate() {
                let node = node_id(name, index);
                locations.insert(node.clone(), (name.clone(), index));
                predecessors.entry(node.clone()).or_default();

                let targets: Vec<usize> = match stmt {
                    StmtKind::Return { .. } => Vec::new(),
                    StmtKind::Goto { target } => vec![*target],
                    StmtKind::IfNull { target, .. } if *target == index + 1 => vec![index + 1],
                    StmtKind::IfNull { target, .. } => vec![index + 1, *target],
                    _ => vec![index + 1],
                };
                for &target in &targets {
                    if target >= len {
                        return Err(ProgramError::BranchOutOfRange {
                            method: name.clone(),
                            statement: node.clone(),
                            target,
                            len,
                        });
                    }
                }

                if let StmtKind::Invoke {
                    receiver,
                    callees,
                    args,
                    ..
                } = stmt
                {
                    for callee in callees {
                        let Some(decl) = methods.get(callee) else {
                            return Err(ProgramError::UnknownCallee {
                                call_site: node.clone(),
                                callee: callee.clone(),
                            });
                        };
                        if decl.has_body() && decl.params.len() != args.len() {
                            return Err(ProgramError::ArityMismatch {
                                call_site: node.clone(),
                                callee: callee.clone(),
                                args: args.len(),
                                params: decl.params.len(),
                            });
                        }
                        if decl.has_body() && receiver.is_some() && !decl.is_instance {
                            return Err(ProgramError::NotAnInstanceMethod {
                                call_site: node.clone(),
                                callee: callee.clone(),
                            });
                        }
                        callers.entry(callee.clone()).or_default().push(node.clone());
                    }
                }

                successors.insert(
                    node,
                    targets.into_iter().map(|t| node_id(name, t)).collect(),
                );
            }
        }

        for (node, succs) in &successors {
            for succ in succs {
                predecessors.entry(succ.clone()).or_default().push(node.clone());
            }
        }
        for preds in predecessors.values_mut() {
            preds.sort();
        }

        let reachable = Self::reachable_from(&methods, &order, &entries);
        debug!(
            methods = order.len(),
            statements = locations.len(),
            reachable = reachable.len(),
            "program graph built"
        );

        Ok(Self {
            methods,
            order,
            locations,
            successors,
            predecessors,
            callers,
            reachable,
        })
    }

    fn reachable_from(
        methods: &FxHashMap<String, MethodDecl>,
        order: &[String],
        entries: &[String],
    ) -> Vec<String> {
        if entries.is_empty() {
            return order.to_vec();
        }

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut reachable = Vec::new();
        let mut queue: VecDeque<&str> = entries.iter().map(String::as_str).collect();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            reachable.push(name.to_string());
            let Some(body) = methods.get(name).and_then(|m| m.body.as_ref()) else {
                continue;
            };
            for stmt in body {
                if let StmtKind::Invoke { callees, .. } = stmt {
                    queue.extend(callees.iter().map(String::as_str));
                }
            }
        }
        reachable
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.get(name)
    }

    /// Declared methods in declaration order
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.order.iter().filter_map(|name| self.methods.get(name))
    }

    /// `(method, index)` of a node
    pub fn location(&self, node: &str) -> Option<(&str, usize)> {
        self.locations
            .get(node)
            .map(|(method, index)| (method.as_str(), *index))
    }

    pub fn statement(&self, node: &str) -> Option<&StmtKind> {
        let (method, index) = self.location(node)?;
        self.methods.get(method)?.body.as_ref()?.get(index)
    }

    /// Declarations of the methods invoked at `call_site`
    pub fn callee_decls(&self, call_site: &str) -> Vec<&MethodDecl> {
        match self.statement(call_site) {
            Some(StmtKind::Invoke { callees, .. }) => {
                callees.iter().filter_map(|c| self.methods.get(c)).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn statement_count(&self) -> usize {
        self.locations.len()
    }

    pub(crate) fn successors(&self, node: &str) -> &[String] {
        self.successors.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn predecessors(&self, node: &str) -> &[String] {
        self.predecessors.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn call_sites_of(&self, method: &str) -> &[String] {
        self.callers.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn reachable(&self) -> &[String] {
        &self.reachable
    }

    /// Node ids of a method body, `None` without a body
    pub(crate) fn nodes_of(&self, method: &str) -> Option<Vec<String>> {
        let body = self.methods.get(method)?.body.as_ref()?;
        Some((0..body.len()).map(|i| node_id(method, i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProgramGraph {
        let mut builder = ProgramBuilder::new();
        builder
            .method("main")
            .stmt(StmtKind::new_object("f", "File"))
            .stmt(StmtKind::if_null("f", 3))
            .stmt(StmtKind::call_method("f", "File.open"))
            .stmt(StmtKind::call_static("helper", &["f"]));
        builder
            .method("helper")
            .param("p")
            .stmt(StmtKind::call_method("p", "File.close"));
        builder.method("unused").stmt(StmtKind::nop());
        builder.library_method("File.open");
        builder.library_method("File.close");
        builder.entry("main");
        builder.build().unwrap()
    }

    #[test]
    fn test_build_appends_return() {
        let program = sample();
        let body = program.method("main").unwrap().body.as_ref().unwrap();
        assert_eq!(body.len(), 5);
        assert!(body[4].is_return());
        assert_eq!(program.statement("helper:1"), Some(&StmtKind::ret(None)));
    }

    #[test]
    fn test_successors_and_predecessors() {
        let program = sample();
        assert_eq!(program.successors("main:1"), ["main:2", "main:3"]);
        assert!(program.successors("main:4").is_empty());
        assert_eq!(program.predecessors("main:3"), ["main:1", "main:2"]);
        assert!(program.predecessors("main:0").is_empty());
    }

    #[test]
    fn test_callers_and_reachability() {
        let program = sample();
        assert_eq!(program.call_sites_of("helper"), ["main:3"]);
        assert_eq!(program.call_sites_of("File.close"), ["helper:0"]);

        let reachable = program.reachable();
        assert!(reachable.contains(&"main".to_string()));
        assert!(reachable.contains(&"helper".to_string()));
        assert!(reachable.contains(&"File.open".to_string()));
        assert!(!reachable.contains(&"unused".to_string()));
    }

    #[test]
    fn test_library_methods_have_no_nodes() {
        let program = sample();
        assert!(program.nodes_of("File.open").is_none());
        assert_eq!(program.nodes_of("helper").unwrap(), ["helper:0", "helper:1"]);
        assert_eq!(program.callee_decls("main:2")[0].simple_name(), "open");
    }

    #[test]
    fn test_unknown_callee_is_rejected() {
        let mut builder = ProgramBuilder::new();
        builder
            .method("main")
            .stmt(StmtKind::call_method("f", "File.open"));
        assert_eq!(
            builder.build().unwrap_err(),
            ProgramError::UnknownCallee {
                call_site: "main:0".to_string(),
                callee: "File.open".to_string(),
            }
        );
    }

    #[test]
    fn test_branch_out_of_range_is_rejected() {
        let mut builder = ProgramBuilder::new();
        builder.method("main").stmt(StmtKind::goto(7));
        assert!(matches!(
            builder.build(),
            Err(ProgramError::BranchOutOfRange { target: 7, len: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_and_arity_errors() {
        let mut builder = ProgramBuilder::new();
        builder.method("m");
        builder.method("m");
        assert_eq!(
            builder.build().unwrap_err(),
            ProgramError::DuplicateMethod("m".to_string())
        );

        let mut builder = ProgramBuilder::new();
        builder.method("helper").param("p");
        builder
            .method("main")
            .stmt(StmtKind::call_static("helper", &[]));
        assert!(matches!(
            builder.build(),
            Err(ProgramError::ArityMismatch { args: 0, params: 1, .. })
        ));
    }

    #[test]
    fn test_receiver_requires_instance_method() {
        let mut builder = ProgramBuilder::new();
        builder.method("Flow.run");
        builder
            .method("main")
            .stmt(StmtKind::new_object("x", "Flow"))
            .stmt(StmtKind::call_method("x", "Flow.run"));
        assert!(matches!(
            builder.build(),
            Err(ProgramError::NotAnInstanceMethod { .. })
        ));
    }

    #[test]
    fn test_unknown_entry() {
        let mut builder = ProgramBuilder::new();
        builder.method("main");
        builder.entry("run");
        assert_eq!(
            builder.build().unwrap_err(),
            ProgramError::UnknownEntry("run".to_string())
        );
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("java.io.PrintStream.close"), "close");
        assert_eq!(simple_name("close"), "close");
    }
}
