use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use crate::class::Class;
use crate::environment::Environment;
use crate::error::{Error, RuntimeError, Unwind};
use crate::expr::{Expr, ExprVisitor};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::{ForData, Stmt, StmtVisitor};
use crate::token::{Token, Type};

type ExecResult = Result<(), Unwind>;
type EvalResult = Result<Object, Unwind>;

/// Walks the resolved tree and produces the program's effects. Program
/// output goes through the injected writer; diagnostics go to stderr.
pub struct Interpreter<'a> {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<Token, usize>,
    repl_mode: bool,
    output: &'a mut dyn Write,
}

impl<'a> Interpreter<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new(None)));

        for native in NativeFunction::get_globals() {
            let name = native.name.lexeme.clone();
            globals.borrow_mut().define(&name, Object::from(native));
        }

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            repl_mode: false,
            output,
        }
    }

    /// Makes expression statements echo their value, like the prompt does.
    pub fn enable_repl_mode(&mut self) {
        self.repl_mode = true;
    }

    /// Records the scope distance of a local reference.
    /// Called by the resolver before interpretation starts.
    pub fn resolve(&mut self, name: &Token, depth: usize) {
        self.locals.insert(name.clone(), depth);
    }

    /// Executes the statements in order. Runtime errors and stray break
    /// signals are reported here and stop the run.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for statement in statements {
            let result = match statement {
                Stmt::Expression(data) if self.repl_mode => {
                    self.evaluate(&data.expr).map(|value| {
                        writeln!(self.output, "{value}").expect("failed to write to output");
                    })
                },
                _ => self.execute(statement),
            };

            match result {
                Ok(()) => (),
                Err(Unwind::Error(error)) => {
                    error.throw();
                    return;
                },
                Err(Unwind::Break(token)) => {
                    RuntimeError {
                        token,
                        message: "Can't break outside of a loop".to_string(),
                    }.throw();
                    return;
                },
                // The resolver rejects top-level returns.
                Err(Unwind::Return(_)) => unreachable!(),
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        stmt.accept(self)
    }

    /// Executes the statements in the given environment and restores the
    /// previous one on every exit path, unwinding included.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> ExecResult {
        let previous = mem::replace(&mut self.environment, environment);

        let result = statements.iter().try_for_each(|statement| self.execute(statement));

        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        expr.accept(self)
    }

    /// Looks a variable up at its resolved distance, or in the globals when
    /// the resolver recorded nothing.
    fn look_up_variable(&self, name: &Token) -> EvalResult {
        match self.locals.get(name) {
            Some(distance) => self.environment.borrow().get_at(*distance, name),
            None => self.globals.borrow().get(name),
        }.map_err(Unwind::from)
    }

    fn binary_type_error(operator: &Token, left: &Object, right: &Object) -> Unwind {
        RuntimeError {
            token: operator.clone(),
            message: format!(
                "Binary operation '{}' is not supported between {} type and {} type",
                operator.lexeme,
                left.type_str(),
                right.type_str(),
            ),
        }.into()
    }

    /// Runs a for loop inside its own environment (set up by the caller).
    fn execute_for(&mut self, data: &ForData) -> ExecResult {
        if let Some(initializer) = &data.initializer {
            self.execute(initializer)?;
        }

        while self.evaluate(&data.condition)?.is_truthy() {
            match self.execute(&data.body) {
                Ok(()) => (),
                Err(Unwind::Break(_)) => return Ok(()),
                Err(other) => return Err(other),
            }

            if let Some(increment) = &data.increment {
                self.evaluate(increment)?;
            }
        }

        Ok(())
    }
}

impl<'a> ExprVisitor<EvalResult> for Interpreter<'a> {
    fn visit_literal_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Literal(literal) = expr else { unreachable!() };

        Ok(Object::from(literal.clone()))
    }

    fn visit_unary_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Unary(unary) = expr else { unreachable!() };

        let right = self.evaluate(&unary.expr)?;

        match unary.operator.r#type {
            Type::Minus => {
                let type_str = right.type_str().to_string();
                (-right).ok_or_else(|| RuntimeError {
                    token: unary.operator.clone(),
                    message: format!("Unary operation '-' is not supported for {type_str} type"),
                }.into())
            },
            Type::Bang => Ok(Object::from(!right.is_truthy())),
            _ => unreachable!(),
        }
    }

    fn visit_binary_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Binary(binary) = expr else { unreachable!() };

        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;
        let operator = &binary.operator;

        match operator.r#type {
            Type::Plus | Type::Minus | Type::Star | Type::Slash => {
                let error = || Self::binary_type_error(operator, &left, &right);
                let result = match operator.r#type {
                    Type::Plus => left.clone() + right.clone(),
                    Type::Minus => left.clone() - right.clone(),
                    Type::Star => left.clone() * right.clone(),
                    Type::Slash => left.clone() / right.clone(),
                    _ => unreachable!(),
                };
                result.ok_or_else(error)
            },
            Type::Greater | Type::GreaterEqual | Type::Less | Type::LessEqual => {
                match (left.as_number(), right.as_number()) {
                    (Some(l), Some(r)) => Ok(Object::from(match operator.r#type {
                        Type::Greater => l > r,
                        Type::GreaterEqual => l >= r,
                        Type::Less => l < r,
                        Type::LessEqual => l <= r,
                        _ => unreachable!(),
                    })),
                    _ => Err(Self::binary_type_error(operator, &left, &right)),
                }
            },
            // Values of different types are unequal, never an error.
            Type::EqualEqual => Ok(Object::from(left == right)),
            Type::BangEqual => Ok(Object::from(left != right)),
            _ => unreachable!(),
        }
    }

    fn visit_grouping_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Grouping(grouping) = expr else { unreachable!() };

        self.evaluate(&grouping.expr)
    }

    fn visit_variable_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Variable(variable) = expr else { unreachable!() };

        self.look_up_variable(&variable.name)
    }

    fn visit_assign_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Assign(assign) = expr else { unreachable!() };

        let value = self.evaluate(&assign.value)?;

        match self.locals.get(&assign.name) {
            Some(distance) => {
                self.environment.borrow_mut().assign_at(*distance, &assign.name, value.clone());
            },
            None => {
                self.globals.borrow_mut().assign(&assign.name, value.clone())?;
            },
        }

        Ok(value)
    }

    fn visit_logical_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Logical(logical) = expr else { unreachable!() };

        let left = self.evaluate(&logical.left)?;

        // Short-circuit hands back the deciding operand itself, not a
        // coerced boolean.
        if logical.operator.r#type == Type::Or {
            if left.is_truthy() {
                return Ok(left);
            }
        } else if !left.is_truthy() {
            return Ok(left);
        }

        self.evaluate(&logical.right)
    }

    fn visit_break_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Break(break_expr) = expr else { unreachable!() };

        Err(Unwind::Break(break_expr.keyword.clone()))
    }

    fn visit_call_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Call(call) = expr else { unreachable!() };

        let callee = self.evaluate(&call.callee)?;

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let callable: &dyn Callable = match &callee {
            Object::Function(function) => function,
            Object::NativeFunction(function) => function,
            Object::Class(class) => class,
            _ => {
                return Err(RuntimeError {
                    token: call.paren.clone(),
                    message: "Can only call functions and classes".to_string(),
                }.into());
            },
        };

        if arguments.len() != callable.arity() {
            return Err(RuntimeError {
                token: call.paren.clone(),
                message: format!(
                    "function {} requires {} argument(s) but {} given",
                    callable.name(),
                    callable.arity(),
                    arguments.len(),
                ),
            }.into());
        }

        callable.call(self, arguments)
    }

    fn visit_get_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Get(get) = expr else { unreachable!() };

        let object = self.evaluate(&get.object)?;

        if let Object::Instance(instance) = &object {
            return instance.borrow().get(&get.name, &object).map_err(Unwind::from);
        }

        Err(RuntimeError {
            token: get.name.clone(),
            message: "Only instances have properties".to_string(),
        }.into())
    }

    fn visit_set_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Set(set) = expr else { unreachable!() };

        let object = self.evaluate(&set.object)?;

        let Object::Instance(instance) = object else {
            return Err(RuntimeError {
                token: set.name.clone(),
                message: "Only instances have fields".to_string(),
            }.into());
        };

        let value = self.evaluate(&set.value)?;
        instance.borrow_mut().set(&set.name, value.clone());

        Ok(value)
    }

    fn visit_this_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::This(this) = expr else { unreachable!() };

        self.look_up_variable(&this.keyword)
    }

    fn visit_super_expr(&mut self, expr: &Expr) -> EvalResult {
        let Expr::Super(super_expr) = expr else { unreachable!() };

        // The resolver bound `super` one scope outside `this`.
        let distance = *self.locals.get(&super_expr.keyword).expect("'super' to be resolved");

        let superclass = self.environment.borrow().get_at(distance, &super_expr.keyword)?;
        let object = self.environment.borrow().get_at(distance - 1, &Token::from("this"))?;

        let Object::Class(superclass) = superclass else { unreachable!() };

        let method = superclass.borrow().find_method(&super_expr.method.lexeme);
        match method {
            Some(method) => Ok(Object::from(method.bind(object))),
            None => Err(RuntimeError {
                token: super_expr.method.clone(),
                message: format!("Undefined property '{}'", super_expr.method.lexeme),
            }.into()),
        }
    }
}

impl<'a> StmtVisitor<ExecResult> for Interpreter<'a> {
    fn visit_expression_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Expression(data) = stmt else { unreachable!() };

        self.evaluate(&data.expr)?;
        Ok(())
    }

    fn visit_print_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Print(data) = stmt else { unreachable!() };

        let value = self.evaluate(&data.expr)?;
        writeln!(self.output, "{value}").expect("failed to write to output");

        Ok(())
    }

    fn visit_var_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Var(data) = stmt else { unreachable!() };

        let value = match &data.initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => Object::from(Literal::Nil),
        };

        self.environment.borrow_mut().define(&data.name.lexeme, value);
        Ok(())
    }

    fn visit_block_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Block(data) = stmt else { unreachable!() };

        let environment = Environment::new(Some(Rc::clone(&self.environment)));
        self.execute_block(&data.statements, Rc::new(RefCell::new(environment)))
    }

    fn visit_if_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::If(data) = stmt else { unreachable!() };

        if self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.then_branch)?;
        } else if let Some(else_branch) = &data.else_branch {
            self.execute(else_branch)?;
        }

        Ok(())
    }

    fn visit_while_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::While(data) = stmt else { unreachable!() };

        while self.evaluate(&data.condition)?.is_truthy() {
            match self.execute(&data.body) {
                Ok(()) => (),
                Err(Unwind::Break(_)) => break,
                Err(other) => return Err(other),
            }
        }

        Ok(())
    }

    fn visit_for_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::For(data) = stmt else { unreachable!() };

        // One environment for the whole loop, matching the resolver's single
        // scope. Restored on every exit path.
        let environment = Environment::new(Some(Rc::clone(&self.environment)));
        let previous = mem::replace(&mut self.environment, Rc::new(RefCell::new(environment)));

        let result = self.execute_for(data);

        self.environment = previous;
        result
    }

    fn visit_function_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Function(data) = stmt else { unreachable!() };

        let function = Function::new(Rc::clone(data), Rc::clone(&self.environment), false);
        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(function));

        Ok(())
    }

    fn visit_return_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Return(data) = stmt else { unreachable!() };

        let value = match &data.value {
            Some(value) => self.evaluate(value)?,
            None => Object::from(Literal::Nil),
        };

        Err(Unwind::Return(value))
    }

    fn visit_class_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        let Stmt::Class(data) = stmt else { unreachable!() };

        let superclass = match &data.superclass {
            Some(superclass) => {
                let Expr::Variable(variable) = superclass else { unreachable!() };

                match self.evaluate(superclass)? {
                    Object::Class(class) => Some(class),
                    _ => {
                        return Err(RuntimeError {
                            token: variable.name.clone(),
                            message: "Superclass must be a class".to_string(),
                        }.into());
                    },
                }
            },
            None => None,
        };

        // Defined as nil first so the methods can refer to the class itself.
        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(Literal::Nil));

        if let Some(superclass) = &superclass {
            let mut environment = Environment::new(Some(Rc::clone(&self.environment)));
            environment.define("super", Object::from(Rc::clone(superclass)));
            self.environment = Rc::new(RefCell::new(environment));
        }

        let mut methods = HashMap::new();
        for method in &data.methods {
            let Stmt::Function(declaration) = method else { unreachable!() };

            let function = Function::new(
                Rc::clone(declaration),
                Rc::clone(&self.environment),
                declaration.name.lexeme.eq("init"),
            );
            methods.insert(declaration.name.lexeme.clone(), function);
        }

        if superclass.is_some() {
            let enclosing = self.environment.borrow().enclosing.clone()
                .expect("'super' environment to have an enclosing environment");
            self.environment = enclosing;
        }

        let class = Rc::new(RefCell::new(Class::new(data.name.lexeme.clone(), superclass, methods)));
        self.environment.borrow_mut().assign(&data.name, Object::from(class))?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(source: &str) -> String {
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);

        let tokens = Scanner::new(source).scan_tokens();
        let statements = Parser::new(tokens).parse();
        Resolver::new(&mut interpreter).resolve(&statements);
        interpreter.interpret(&statements);

        drop(interpreter);
        String::from_utf8(output).unwrap()
    }

    fn run_repl(source: &str) -> String {
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);
        interpreter.enable_repl_mode();

        let tokens = Scanner::new(source).scan_tokens();
        let statements = Parser::new(tokens).parse();
        Resolver::new(&mut interpreter).resolve(&statements);
        interpreter.interpret(&statements);

        drop(interpreter);
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn evaluate_arithmetic() {
        assert_eq!(run("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn evaluate_string_concat() {
        assert_eq!(run("print \"foo\" + \"bar\";"), "foobar\n");
        assert_eq!(run("print \"n = \" + 4;"), "n = 4\n");
    }

    #[test]
    fn evaluate_equality_across_types() {
        assert_eq!(run("print 1 == \"1\";"), "false\n");
        assert_eq!(run("print nil == nil;"), "true\n");
        assert_eq!(run("print 1 != 2;"), "true\n");
    }

    #[test]
    fn truthiness_in_conditions() {
        assert_eq!(run("if (0) print \"zero\"; else print \"no\";"), "zero\n");
        assert_eq!(run("if (\"\") print \"yes\"; else print \"empty\";"), "empty\n");
        assert_eq!(run("print !!nil;"), "false\n");
    }

    #[test]
    fn short_circuit_skips_right_operand() {
        let source = "
            fun touch() { print \"touched\"; return true; }
            print true or touch();
            print false and touch();
        ";
        assert_eq!(run(source), "true\nfalse\n");
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(run("print \"left\" or \"right\";"), "left\n");
        assert_eq!(run("print nil or \"right\";"), "right\n");
        assert_eq!(run("print 1 and 2;"), "2\n");
    }

    #[test]
    fn block_scoping_restores_environment() {
        let source = "
            var a = \"outer\";
            { var a = \"inner\"; print a; }
            print a;
        ";
        assert_eq!(run(source), "inner\nouter\n");
    }

    #[test]
    fn closure_observes_later_assignments() {
        let source = "
            fun mk(n) {
                fun inc() { n = n + 1; return n; }
                return inc;
            }
            var f = mk(10);
            print f();
            print f();
        ";
        assert_eq!(run(source), "11\n12\n");
    }

    #[test]
    fn for_loop_with_break() {
        assert_eq!(run("for (var i = 0; i < 5; i = i + 1) { if (i >= 3) break; print i; }"), "0\n1\n2\n");
    }

    #[test]
    fn while_loop_with_break() {
        let source = "var i = 0; while (true) { if (i >= 2) break; print i; i = i + 1; }";
        assert_eq!(run(source), "0\n1\n");
    }

    #[test]
    fn method_binding_carries_this() {
        let source = "
            class Greeter {
                init(name) { this.name = name; }
                greet() { return \"hi \" + this.name; }
            }
            var m = Greeter(\"ada\").greet;
            print m();
        ";
        assert_eq!(run(source), "hi ada\n");
    }

    #[test]
    fn super_dispatches_to_parent() {
        let source = "
            class A { f() { return 1; } }
            class B < A { f() { return super.f() + 10; } }
            print B().f();
        ";
        assert_eq!(run(source), "11\n");
    }

    #[test]
    fn initializer_returns_instance() {
        let source = "
            class A { init() { return; } }
            print A().init();
        ";
        assert_eq!(run(source), "instance<class<A>>\n");
    }

    #[test]
    fn repl_echoes_expression_statements() {
        assert_eq!(run_repl("1 + 2;"), "3\n");
        assert_eq!(run_repl("nil;"), "nil\n");
    }

    #[test]
    fn repl_does_not_echo_other_statements() {
        assert_eq!(run_repl("var a = 1;"), "");
        assert_eq!(run_repl("print 4;"), "4\n");
    }

    #[test]
    fn stringification_of_callables() {
        let source = "
            fun f() {}
            class A {}
            print f;
            print A;
            print A();
            print str;
        ";
        assert_eq!(run(source), "function<f>\nclass<A>\ninstance<class<A>>\ncallable<str>\n");
    }

    #[test]
    fn division_by_zero_is_infinite() {
        assert_eq!(run("print 1 / 0;"), "inf\n");
    }
}
