use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tree_sitter::{Node, Tree};

/// Handle into the scope arena of an [`AnalysisResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub usize);

/// A lexical scope. Only function-level scoping is tracked: function
/// declarations, function expressions and arrow functions introduce a
/// scope, block statements do not. `let`/`const` block scoping is
/// therefore approximated, which is intentional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    /// Enclosing scope, lookup-only back-reference
    pub parent: Option<ScopeId>,
    /// Locally declared variables and parameters, in declaration order
    pub variables: Vec<String>,
    /// Locally declared functions, in declaration order
    pub functions: Vec<String>,
    /// Whether this scope belongs to a function body (the global scope
    /// does not)
    pub is_function: bool,
}

/// Declaration kind of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

/// A declared variable, at any nesting depth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub scope: ScopeId,
}

/// A declared function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<String>,
    pub scope: ScopeId,
}

/// Result of one analysis pass over a program.
///
/// Variables and functions are flat lists regardless of nesting depth,
/// distinguished only by their `scope` handle. The call and
/// global-reference maps are keyed by function name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub variables: Vec<Variable>,
    pub functions: Vec<FunctionInfo>,
    /// function name -> names of functions it calls (deduplicated)
    pub call_graph: HashMap<String, BTreeSet<String>>,
    /// function name -> free identifiers it references (deduplicated)
    pub global_refs: HashMap<String, BTreeSet<String>>,
    pub scopes: Vec<Scope>,
}

impl AnalysisResult {
    /// Names called by the given function, if any were recorded
    pub fn calls_of(&self, function: &str) -> Option<&BTreeSet<String>> {
        self.call_graph.get(function)
    }

    /// Free identifiers referenced by the given function
    pub fn globals_of(&self, function: &str) -> Option<&BTreeSet<String>> {
        self.global_refs.get(function)
    }
}

/// Single-pass reference analyzer.
///
/// Walks the tree once, pre-order depth-first, building a symbol table of
/// declarations, a call-dependency map and a free-variable map. The
/// scoping model is a conservative syntactic approximation, not a real
/// resolver: local lookup stops at the first function boundary, so a name
/// captured from an enclosing closure is reported as a global reference
/// of the inner function. That behavior is relied upon downstream and
/// must be preserved.
pub struct Analyzer<'s> {
    source: &'s str,
    scopes: Vec<Scope>,
    current_scope: ScopeId,
    /// Single slot, not a stack. Nested function declarations overwrite
    /// it for their own traversal and restore the enclosing name on exit.
    current_function: Option<String>,
    result: AnalysisResult,
}

impl<'s> Analyzer<'s> {
    pub fn new(source: &'s str) -> Self {
        let global = Scope {
            parent: None,
            variables: Vec::new(),
            functions: Vec::new(),
            is_function: false,
        };
        Self {
            source,
            scopes: vec![global],
            current_scope: ScopeId(0),
            current_function: None,
            result: AnalysisResult::default(),
        }
    }

    /// Analyze a parsed program
    pub fn analyze(mut self, tree: &Tree) -> AnalysisResult {
        self.visit(tree.root_node());
        self.result.scopes = self.scopes;
        self.result
    }

    fn text(&self, node: Node) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                self.visit_function_declaration(node);
            }
            "function_expression" | "function" | "generator_function" | "arrow_function" => {
                self.visit_function_like(node);
            }
            "variable_declaration" | "lexical_declaration" => {
                self.visit_variable_declaration(node);
            }
            "call_expression" => self.visit_call(node),
            "member_expression" => self.visit_member(node),
            "identifier" => self.visit_identifier(node),
            // Unrecognized node kinds degrade to plain recursive descent;
            // no dependency information is extracted from them.
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }
    }

    fn visit_function_declaration(&mut self, node: Node) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string());

        let owning_scope = self.current_scope;
        let params = self.collect_params(node);

        if let Some(ref name) = name {
            self.scopes[owning_scope.0].functions.push(name.clone());
            self.result.functions.push(FunctionInfo {
                name: name.clone(),
                params: params.clone(),
                scope: owning_scope,
            });
        }

        self.push_function_scope(&params);

        let saved = self.current_function.take();
        self.current_function = name.or_else(|| saved.clone());

        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body);
        }

        self.current_function = saved;
        self.pop_scope();
    }

    /// Function expressions and arrow functions get a scope of their own
    /// but do not update the current-function slot; their calls are
    /// attributed to the enclosing named function.
    fn visit_function_like(&mut self, node: Node) {
        let params = self.collect_params(node);
        self.push_function_scope(&params);

        if let Some(name) = node.child_by_field_name("name") {
            let name = self.text(name).to_string();
            self.scopes[self.current_scope.0].variables.push(name);
        }

        if let Some(body) = node.child_by_field_name("body") {
            if body.kind() == "statement_block" {
                self.visit_children(body);
            } else {
                // Arrow function with an expression body
                self.visit(body);
            }
        }

        self.pop_scope();
    }

    fn push_function_scope(&mut self, params: &[String]) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(self.current_scope),
            variables: params.to_vec(),
            functions: Vec::new(),
            is_function: true,
        });
        self.current_scope = id;
        id
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current_scope.0].parent {
            self.current_scope = parent;
        }
    }

    /// Collect parameter names in declaration order. Identifier leaves
    /// inside patterns count as parameters; default-value expressions are
    /// not descended into.
    fn collect_params(&self, node: Node) -> Vec<String> {
        let mut params = Vec::new();

        if let Some(single) = node.child_by_field_name("parameter") {
            if single.kind() == "identifier" {
                params.push(self.text(single).to_string());
            }
            return params;
        }

        let Some(list) = node.child_by_field_name("parameters") else {
            return params;
        };

        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            self.collect_pattern_names(child, &mut params);
        }
        params
    }

    fn collect_pattern_names(&self, node: Node, out: &mut Vec<String>) {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                out.push(self.text(node).to_string());
            }
            "assignment_pattern" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.collect_pattern_names(left, out);
                }
            }
            _ => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    self.collect_pattern_names(child, out);
                }
            }
        }
    }

    fn visit_variable_declaration(&mut self, node: Node) {
        let kind = match node.kind() {
            "variable_declaration" => VariableKind::Var,
            _ => {
                if self.text(node).trim_start().starts_with("const") {
                    VariableKind::Const
                } else {
                    VariableKind::Let
                }
            }
        };

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "variable_declarator")
            .collect();

        for declarator in declarators {
            if let Some(name) = declarator.child_by_field_name("name") {
                if name.kind() == "identifier" {
                    let name = self.text(name).to_string();
                    self.scopes[self.current_scope.0].variables.push(name.clone());
                    // Registered regardless of depth; the scope handle is
                    // what tells nested declarations apart.
                    self.result.variables.push(Variable {
                        name,
                        kind,
                        scope: self.current_scope,
                    });
                } else {
                    // Destructuring pattern: names inside it still become
                    // locals, conservatively.
                    let mut names = Vec::new();
                    self.collect_pattern_names(name, &mut names);
                    for name in names {
                        self.scopes[self.current_scope.0].variables.push(name.clone());
                        self.result.variables.push(Variable {
                            name,
                            kind,
                            scope: self.current_scope,
                        });
                    }
                }
            }
            if let Some(value) = declarator.child_by_field_name("value") {
                self.visit(value);
            }
        }
    }

    fn visit_call(&mut self, node: Node) {
        if let Some(callee) = node.child_by_field_name("function") {
            if callee.kind() == "identifier" {
                let callee_name = self.text(callee).to_string();
                if let Some(caller) = self.current_function.clone() {
                    self.result
                        .call_graph
                        .entry(caller)
                        .or_default()
                        .insert(callee_name);
                }
            } else {
                self.visit(callee);
            }
        }
        if let Some(args) = node.child_by_field_name("arguments") {
            self.visit_children(args);
        }
    }

    /// Member expressions contribute only their object: `a.b.c` reports
    /// `a`, never `b` or `c`.
    fn visit_member(&mut self, node: Node) {
        if let Some(object) = node.child_by_field_name("object") {
            self.visit(object);
        }
    }

    fn visit_identifier(&mut self, node: Node) {
        let Some(function) = self.current_function.clone() else {
            return;
        };
        let name = self.text(node).to_string();
        if !self.is_local(&name) {
            self.result
                .global_refs
                .entry(function)
                .or_default()
                .insert(name);
        }
    }

    /// Walks from the current scope outward but stops at the first
    /// function-scope boundary. A name free in an outer function but
    /// captured by an inner one is therefore reported as a global
    /// reference of the inner function.
    fn is_local(&self, name: &str) -> bool {
        let mut scope = Some(self.current_scope);
        while let Some(id) = scope {
            let s = &self.scopes[id.0];
            if s.variables.iter().any(|v| v == name) || s.functions.iter().any(|f| f == name) {
                return true;
            }
            if s.is_function {
                break;
            }
            scope = s.parent;
        }
        false
    }
}
