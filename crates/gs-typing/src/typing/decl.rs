//! Package-level declaration collection and on-demand resolution.

use std::rc::Rc;

use gs_core::ast::*;
use gs_core::span::Span;
use tracing::debug;

use crate::typing::lookup::assignable;
use crate::typing::scope::{DeclRef, Object, ObjectId, ObjectKind, Resolution, ScopeId, ScopeKind};
use crate::typing::types::{BasicKind, Method, NamedType, Signature, Type};
use crate::{CheckResult, Checker, FuncContext};

fn gen_decl(files: &[File], file: usize, decl: usize) -> Option<&GenDecl> {
    match files.get(file)?.decls.get(decl)? {
        Decl::Gen(gen) => Some(gen),
        Decl::Func(_) => None,
    }
}

fn value_spec(files: &[File], file: usize, decl: usize, spec: usize) -> Option<&ValueSpec> {
    match gen_decl(files, file, decl)?.specs.get(spec)? {
        Spec::Value(value) => Some(value),
        _ => None,
    }
}

fn type_spec(files: &[File], file: usize, decl: usize, spec: usize) -> Option<&TypeSpec> {
    match gen_decl(files, file, decl)?.specs.get(spec)? {
        Spec::Type(ty) => Some(ty),
        _ => None,
    }
}

fn func_decl(files: &[File], file: usize, decl: usize) -> Option<&FuncDecl> {
    match files.get(file)?.decls.get(decl)? {
        Decl::Func(func) => Some(func),
        Decl::Gen(_) => None,
    }
}

/// Name of the type a method is declared on: `T` for `t T` and `t *T`.
fn receiver_base(expr: &Expr) -> Option<&Ident> {
    match &expr.unparen().kind {
        ExprKind::Star(inner) => receiver_base(inner),
        ExprKind::Ident(ident) => Some(ident),
        _ => None,
    }
}

impl<'c, 'e> Checker<'c, 'e> {
    pub(crate) fn check_package(&mut self) -> CheckResult<ScopeId> {
        let universe = self.env.tree.universe();
        self.package = self.env.tree.push(universe, ScopeKind::Package);

        let files = self.files;
        for (index, file) in files.iter().enumerate() {
            self.collect_file(index, file)?;
        }
        for id in self.package_objects.clone() {
            self.resolve_object(id)?;
        }
        self.check_orphan_methods()?;

        for (index, file) in files.iter().enumerate() {
            for func in file.funcs() {
                if let Some(body) = &func.body {
                    let scope = self.file_scopes[index];
                    self.check_func(func.recv.as_ref(), &func.ty, body, scope)?;
                }
            }
        }
        debug!(package = %self.path, objects = self.package_objects.len(), "package checked");
        Ok(self.package)
    }

    fn collect_file(&mut self, index: usize, file: &File) -> CheckResult<()> {
        let scope = self.env.tree.push(self.package, ScopeKind::File);
        self.file_scopes.push(scope);

        for (decl_index, decl) in file.decls.iter().enumerate() {
            match decl {
                Decl::Gen(gen) => self.collect_gen_decl(index, decl_index, gen, scope)?,
                Decl::Func(func) => {
                    if let Some(recv) = &func.recv {
                        let base = receiver_base(&recv.ty)
                            .ok_or_else(|| self.error(recv.ty.span, "invalid receiver type"))?;
                        self.methods
                            .entry(base.name.clone())
                            .or_default()
                            .push((index, decl_index));
                    } else if func.name.name != "init" {
                        let object = Object::new(func.name.name.clone(), ObjectKind::Func, None)
                            .with_span(func.name.span)
                            .deferred(DeclRef::Func {
                                file: index,
                                decl: decl_index,
                            });
                        self.declare_package(object)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_gen_decl(
        &mut self,
        file: usize,
        decl: usize,
        gen: &GenDecl,
        file_scope: ScopeId,
    ) -> CheckResult<()> {
        let mut source = 0;
        for (spec_index, spec) in gen.specs.iter().enumerate() {
            match spec {
                Spec::Import(import) => self.collect_import(file_scope, import)?,
                Spec::Value(value) if gen.kind == DeclKind::Const => {
                    if value.ty.is_some() || !value.values.is_empty() {
                        source = spec_index;
                    }
                    for (index, name) in value.names.iter().enumerate() {
                        let object = Object::new(
                            name.name.clone(),
                            ObjectKind::Const { value: None },
                            None,
                        )
                        .with_span(name.span)
                        .deferred(DeclRef::Const {
                            file,
                            decl,
                            spec: spec_index,
                            source,
                            index,
                            iota: spec_index,
                        });
                        self.declare_package(object)?;
                    }
                }
                Spec::Value(value) => {
                    for (index, name) in value.names.iter().enumerate() {
                        let object = Object::new(name.name.clone(), ObjectKind::Var, None)
                            .with_span(name.span)
                            .deferred(DeclRef::Var {
                                file,
                                decl,
                                spec: spec_index,
                                index,
                            });
                        self.declare_package(object)?;
                    }
                }
                Spec::Type(ty) => {
                    let object = Object::new(ty.name.name.clone(), ObjectKind::TypeName, None)
                        .with_span(ty.name.span)
                        .deferred(DeclRef::Type {
                            file,
                            decl,
                            spec: spec_index,
                        });
                    self.declare_package(object)?;
                }
            }
        }
        Ok(())
    }

    fn declare_package(&mut self, object: Object) -> CheckResult<ObjectId> {
        let id = self.declare(self.package, object)?;
        self.package_objects.push(id);
        Ok(id)
    }

    fn collect_import(&mut self, file_scope: ScopeId, import: &ImportSpec) -> CheckResult<()> {
        let (name, scope) = self.import_package(&import.path, import.span)?;
        let local = match &import.name {
            Some(alias) if alias.is_blank() => return Ok(()),
            Some(alias) if alias.name == "." => {
                return Err(self.error(import.span, "dot imports are not supported"))
            }
            Some(alias) => alias.name.clone(),
            None => name,
        };
        let object = Object::new(
            local,
            ObjectKind::PkgName {
                path: import.path.clone(),
                scope,
            },
            None,
        )
        .with_span(import.span);
        self.declare(file_scope, object)?;
        Ok(())
    }

    fn import_package(&mut self, path: &str, span: Span) -> CheckResult<(String, ScopeId)> {
        if let Some((name, scope)) = self.env.packages.get(path) {
            return Ok((name.clone(), *scope));
        }
        if path == self.path || self.env.importing.iter().any(|p| p == path) {
            return Err(self.error(span, format!("import cycle not allowed: {path}")));
        }

        let imported = {
            let env = &mut *self.env;
            env.importer.import(path, &mut *env.fset)
        };
        let files = imported.map_err(|err| self.error(span, err.message))?;
        let name = files
            .first()
            .map(|file| file.package.name.clone())
            .ok_or_else(|| self.error(span, format!("could not import {path} (no Go files)")))?;

        self.env.importing.push(path.to_string());
        let checked = Checker::new(&mut *self.env, &files, path.to_string()).check_package();
        self.env.importing.pop();
        let scope = checked?;

        self.env
            .packages
            .insert(path.to_string(), (name.clone(), scope));
        Ok((name, scope))
    }

    /// Resolve the type of an object, resolving its declaration first when
    /// it is a package-level object that has not been visited yet.
    pub(crate) fn resolve_object(&mut self, id: ObjectId) -> CheckResult<Type> {
        let object = self.env.tree.object(id);
        match object.state {
            Resolution::Done => return Ok(object.ty.clone().unwrap_or_else(Type::invalid)),
            Resolution::InProgress => {
                if let Some(ty) = &object.ty {
                    return Ok(ty.clone());
                }
                let message = match object.kind {
                    ObjectKind::TypeName => format!("invalid recursive type {}", object.name),
                    _ => format!("initialization cycle: {} refers to itself", object.name),
                };
                return Err(self.error(object.span, message));
            }
            Resolution::Pending => {}
        }
        let Some(decl) = object.decl else {
            return Ok(Type::invalid());
        };
        let span = object.span;
        self.env.tree.object_mut(id).state = Resolution::InProgress;

        let files = self.files;
        let missing = || self.error(span, "declaration not found");
        match decl {
            DeclRef::Const {
                file,
                decl,
                spec,
                source,
                index,
                iota,
            } => {
                let name = value_spec(files, file, decl, spec)
                    .and_then(|spec| spec.names.get(index))
                    .ok_or_else(missing)?;
                let source = value_spec(files, file, decl, source).ok_or_else(missing)?;
                let scope = self.file_scopes[file];
                let (ty, value) = self.const_value(name, source, index, iota, scope)?;
                let object = self.env.tree.object_mut(id);
                object.kind = ObjectKind::Const { value };
                self.finish(id, ty.clone());
                Ok(ty)
            }
            DeclRef::Var {
                file,
                decl,
                spec,
                index,
            } => {
                let spec = value_spec(files, file, decl, spec).ok_or_else(missing)?;
                let scope = self.file_scopes[file];
                let types = self.var_spec_types(spec, scope)?;
                // One initializer may define several names; settle all of them.
                for (name, ty) in spec.names.iter().zip(&types) {
                    if let Some(other) = self.env.tree.lookup(self.package, &name.name) {
                        if self.env.tree.object(other).state != Resolution::Done {
                            self.finish(other, ty.clone());
                        }
                    }
                }
                let ty = types.get(index).cloned().unwrap_or_else(Type::invalid);
                self.finish(id, ty.clone());
                Ok(ty)
            }
            DeclRef::Type { file, decl, spec } => {
                let spec = type_spec(files, file, decl, spec).ok_or_else(missing)?;
                let scope = self.file_scopes[file];
                self.resolve_type_spec(id, spec, scope, true)
            }
            DeclRef::Func { file, decl } => {
                let func = func_decl(files, file, decl).ok_or_else(missing)?;
                let scope = self.file_scopes[file];
                let ty = Type::Func(Rc::new(self.signature(&func.ty, scope)?));
                self.finish(id, ty.clone());
                Ok(ty)
            }
        }
    }

    fn finish(&mut self, id: ObjectId, ty: Type) {
        let object = self.env.tree.object_mut(id);
        object.ty = Some(ty);
        object.state = Resolution::Done;
    }

    /// Resolve a type declaration whose object is `id`. Named types are
    /// published before their underlying type is resolved so they can refer
    /// to themselves.
    pub(crate) fn resolve_type_spec(
        &mut self,
        id: ObjectId,
        spec: &TypeSpec,
        scope: ScopeId,
        package_level: bool,
    ) -> CheckResult<Type> {
        if spec.alias {
            let ty = self.resolve_type(&spec.ty, scope)?;
            self.finish(id, ty.clone());
            return Ok(ty);
        }

        let named = NamedType::new(spec.name.name.clone(), Some(self.path.clone()));
        {
            let object = self.env.tree.object_mut(id);
            object.ty = Some(Type::Named(named.clone()));
            object.state = Resolution::InProgress;
        }
        let underlying = self.resolve_type(&spec.ty, scope)?;
        if underlying.underlying().is_invalid() {
            return Err(self.error(
                spec.name.span,
                format!("invalid recursive type {}", spec.name),
            ));
        }
        named.set_underlying(underlying);
        let ty = Type::Named(named.clone());
        self.finish(id, ty.clone());
        if package_level {
            self.attach_methods(&named)?;
        }
        Ok(ty)
    }

    fn attach_methods(&mut self, named: &Rc<NamedType>) -> CheckResult<()> {
        let Some(entries) = self.methods.remove(&named.name) else {
            return Ok(());
        };
        let files = self.files;
        for (file, decl) in entries {
            let Some(func) = func_decl(files, file, decl) else {
                continue;
            };
            let pointer_recv = func
                .recv
                .as_ref()
                .is_some_and(|recv| matches!(recv.ty.unparen().kind, ExprKind::Star(_)));
            let sig = self.signature(&func.ty, self.file_scopes[file])?;
            if named.method(&func.name.name).is_some() {
                return Err(self.error(
                    func.name.span,
                    format!("method {}.{} already declared", named.name, func.name),
                ));
            }
            named.add_method(Method {
                name: func.name.name.clone(),
                sig: Rc::new(sig),
                pointer_recv,
            });
        }
        Ok(())
    }

    fn check_orphan_methods(&mut self) -> CheckResult<()> {
        let files = self.files;
        let Some((base, (file, decl))) = self
            .methods
            .iter()
            .flat_map(|(base, entries)| entries.iter().map(move |entry| (base.clone(), *entry)))
            .min_by_key(|(_, entry)| *entry)
        else {
            return Ok(());
        };
        let span = func_decl(files, file, decl)
            .and_then(|func| func.recv.as_ref())
            .map(|recv| recv.ty.span)
            .unwrap_or_else(Span::null);
        let message = match self.env.tree.lookup(self.package, &base) {
            Some(_) => format!("cannot define new methods on non-local type {base}"),
            None => format!("undefined: {base}"),
        };
        Err(self.error(span, message))
    }

    /// Check a function body in a fresh function scope below `parent`.
    pub(crate) fn check_func(
        &mut self,
        recv: Option<&Field>,
        ty: &FuncType,
        body: &BlockStmt,
        parent: ScopeId,
    ) -> CheckResult<Signature> {
        let sig = self.signature(ty, parent)?;
        let scope = self.push_scope(parent, ScopeKind::Function, ty.id);
        self.env.scopes.insert(body.id, scope);

        if let Some(recv) = recv {
            let recv_ty = self.resolve_type(&recv.ty, parent)?;
            self.declare_vars(scope, &recv.names, &recv_ty)?;
        }
        let mut index = 0;
        for field in &ty.params {
            let param = sig.params.get(index).cloned().unwrap_or_else(Type::invalid);
            self.declare_vars(scope, &field.names, &param)?;
            index += field.arity();
        }
        let mut index = 0;
        for field in &ty.results {
            let result = sig.results.get(index).cloned().unwrap_or_else(Type::invalid);
            self.declare_vars(scope, &field.names, &result)?;
            index += field.arity();
        }

        self.results.push(FuncContext {
            results: sig.results.clone(),
            named_results: ty.results.iter().any(|field| !field.names.is_empty()),
        });
        let saved_iota = self.iota.take();
        let outcome = self.stmts(&body.stmts, scope);
        self.iota = saved_iota;
        self.results.pop();
        outcome?;
        Ok(sig)
    }

    pub(crate) fn declare_vars(
        &mut self,
        scope: ScopeId,
        names: &[Ident],
        ty: &Type,
    ) -> CheckResult<()> {
        for name in names {
            let object = Object::new(name.name.clone(), ObjectKind::Var, Some(ty.clone()))
                .with_span(name.span);
            self.declare(scope, object)?;
        }
        Ok(())
    }

    /// Type and integer value of the `index`-th constant of a spec whose
    /// expressions come from `source`.
    pub(crate) fn const_value(
        &mut self,
        name: &Ident,
        source: &ValueSpec,
        index: usize,
        iota: usize,
        scope: ScopeId,
    ) -> CheckResult<(Type, Option<i128>)> {
        let Some(expr) = source.values.get(index) else {
            return Err(self.error(name.span, "missing init expr for const declaration"));
        };
        let saved = self.iota.replace(iota as i128);
        let ty = self.value(expr, scope);
        let value = match &ty {
            Ok(_) => self.const_int(expr, scope),
            Err(_) => None,
        };
        self.iota = saved;
        let ty = ty?;

        match &source.ty {
            Some(declared) => {
                let declared = self.resolve_type(declared, scope)?;
                if !assignable(&ty, &declared) {
                    return Err(self.error(
                        expr.span,
                        format!(
                            "cannot use {} as {} value in constant declaration",
                            self.describe(expr, &ty),
                            declared
                        ),
                    ));
                }
                Ok((declared, value))
            }
            None => Ok((ty, value)),
        }
    }

    /// Types of the names of a `var` spec, after defaulting untyped values.
    pub(crate) fn var_spec_types(
        &mut self,
        spec: &ValueSpec,
        scope: ScopeId,
    ) -> CheckResult<Vec<Type>> {
        let declared = spec
            .ty
            .as_ref()
            .map(|ty| self.resolve_type(ty, scope))
            .transpose()?;
        let count = spec.names.len();
        if spec.values.is_empty() {
            return match declared {
                Some(declared) => Ok(vec![declared; count]),
                None => Err(self.error(
                    spec.names.first().map(|name| name.span).unwrap_or_else(Span::null),
                    "missing type or init expr",
                )),
            };
        }

        let values = self.rhs_types(count, &spec.values, scope)?;
        let mut types = Vec::with_capacity(count);
        for (index, ty) in values.into_iter().enumerate() {
            let expr = spec.values.get(index).unwrap_or(&spec.values[0]);
            match &declared {
                Some(declared) => {
                    if !assignable(&ty, declared) {
                        return Err(self.error(
                            expr.span,
                            format!(
                                "cannot use {} as {} value in variable declaration",
                                self.describe(expr, &ty),
                                declared
                            ),
                        ));
                    }
                    types.push(declared.clone());
                }
                None => {
                    if matches!(ty, Type::Basic(BasicKind::UntypedNil)) {
                        let message = "use of untyped nil in variable declaration";
                        return Err(self.error(expr.span, message));
                    }
                    types.push(ty.default_type());
                }
            }
        }
        Ok(types)
    }

    /// Declarations inside a function body.
    pub(crate) fn local_decl(&mut self, gen: &GenDecl, scope: ScopeId) -> CheckResult<()> {
        match gen.kind {
            DeclKind::Import => Err(self.error(
                gen.specs
                    .iter()
                    .find_map(|spec| match spec {
                        Spec::Import(import) => Some(import.span),
                        _ => None,
                    })
                    .unwrap_or_else(Span::null),
                "imports must appear before other declarations",
            )),
            DeclKind::Var => {
                for spec in &gen.specs {
                    let Spec::Value(spec) = spec else { continue };
                    let types = self.var_spec_types(spec, scope)?;
                    for (name, ty) in spec.names.iter().zip(types) {
                        self.declare_vars(scope, std::slice::from_ref(name), &ty)?;
                    }
                }
                Ok(())
            }
            DeclKind::Const => {
                let mut source = None;
                for (iota, spec) in gen.specs.iter().enumerate() {
                    let Spec::Value(spec) = spec else { continue };
                    if spec.ty.is_some() || !spec.values.is_empty() {
                        source = Some(spec);
                    }
                    let source = source.unwrap_or(spec);
                    for (index, name) in spec.names.iter().enumerate() {
                        let (ty, value) = self.const_value(name, source, index, iota, scope)?;
                        let kind = ObjectKind::Const { value };
                        let object =
                            Object::new(name.name.clone(), kind, Some(ty)).with_span(name.span);
                        self.declare(scope, object)?;
                    }
                }
                Ok(())
            }
            DeclKind::Type => {
                for spec in &gen.specs {
                    let Spec::Type(spec) = spec else { continue };
                    let object = Object::new(spec.name.name.clone(), ObjectKind::TypeName, None)
                        .with_span(spec.name.span);
                    let id = self.declare(scope, object)?;
                    self.env.tree.object_mut(id).state = Resolution::InProgress;
                    self.resolve_type_spec(id, spec, scope, false)?;
                }
                Ok(())
            }
        }
    }
}
