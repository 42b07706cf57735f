use std::cell::RefCell;
use std::fmt::{Debug, Display};
use std::io::{self, Read};
use std::process;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::environment::Environment;
use crate::error::{RuntimeError, Unwind};
use crate::interpreter::Interpreter;
use crate::literal::Literal;
use crate::object::{Object, Callable};
use crate::stmt::FunctionData;
use crate::token::Token;

/// A user-defined function: a shared reference to its declaration plus the
/// environment that was live when the declaration executed.
#[derive(Clone)]
pub struct Function {
    pub declaration: Rc<FunctionData>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(
        declaration: Rc<FunctionData>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Function { declaration, closure, is_initializer }
    }

    /// Returns a new function sharing this declaration whose closure is a
    /// fresh environment with `this` bound to the instance.
    pub fn bind(&self, instance: Object) -> Function {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));
        environment.define("this", instance);

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    /// Reads the bound `this` out of the closure. Only meaningful for
    /// initializers, which always run bound.
    fn this(&self) -> Result<Object, Unwind> {
        self.closure.borrow().get_at(0, &Token::from("this")).map_err(Unwind::from)
    }
}

impl Callable for Function {
    fn name(&self) -> String {
        self.declaration.name.lexeme.clone()
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Unwind> {
        let mut environment = Environment::new(Some(Rc::clone(&self.closure)));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, Rc::new(RefCell::new(environment))) {
            Ok(()) => (),
            Err(Unwind::Return(value)) => {
                // An initializer hands back its instance no matter what the
                // return statement said.
                if self.is_initializer {
                    return self.this();
                }
                return Ok(value);
            },
            Err(other) => return Err(other),
        }

        if self.is_initializer {
            return self.this();
        }

        Ok(Object::from(Literal::Nil))
    }
}

// Two function values are the same function only if they share both the
// declaration and the captured environment. Binding creates a new closure,
// so every bound method is a distinct value.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.declaration, &other.declaration) && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "function<{}>", self.declaration.name.lexeme)
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "function<{}>", self.declaration.name.lexeme)
    }
}

/// A host-provided routine living in the globals environment.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Token,
    pub arity: usize,
    pub function: fn(&mut Interpreter<'_>, Vec<Object>) -> Result<Object, RuntimeError>,
}

impl Callable for NativeFunction {
    fn name(&self) -> String {
        self.name.lexeme.clone()
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, Unwind> {
        (self.function)(interpreter, arguments).map_err(Unwind::from)
    }
}

impl NativeFunction {
    /// The built-ins defined in the globals environment at startup.
    pub fn get_globals() -> Vec<NativeFunction> {
        vec![
            NativeFunction {
                name: Token::from("clock"),
                arity: 0,
                function: |_, _| {
                    let now = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .expect("time to flow forwards")
                        .as_micros();
                    Ok(Object::from(now as f64))
                },
            },
            NativeFunction {
                name: Token::from("assert"),
                arity: 1,
                function: |_, arguments| {
                    if !arguments[0].is_truthy() {
                        return Err(RuntimeError {
                            token: Token::from("assert"),
                            message: "assert failed".to_string(),
                        });
                    }
                    Ok(Object::from(Literal::Nil))
                },
            },
            NativeFunction {
                name: Token::from("str"),
                arity: 1,
                function: |_, arguments| Ok(Object::from(arguments[0].to_string())),
            },
            NativeFunction {
                name: Token::from("getc"),
                arity: 0,
                function: |_, _| {
                    let mut buffer = [0u8; 1];
                    match io::stdin().read(&mut buffer) {
                        Ok(0) | Err(_) => Ok(Object::from(-1.0)),
                        Ok(_) => Ok(Object::from(buffer[0] as f64)),
                    }
                },
            },
            NativeFunction {
                name: Token::from("chr"),
                arity: 1,
                function: |_, arguments| match arguments[0].as_number() {
                    Some(code) => Ok(Object::from((code as u8 as char).to_string())),
                    None => Err(RuntimeError {
                        token: Token::from("chr"),
                        message: format!("expected a number but got {} type", arguments[0].type_str()),
                    }),
                },
            },
            NativeFunction {
                name: Token::from("exit"),
                arity: 1,
                function: |_, arguments| match arguments[0].as_number() {
                    Some(code) => process::exit(code as i32),
                    None => Err(RuntimeError {
                        token: Token::from("exit"),
                        message: format!("expected a number but got {} type", arguments[0].type_str()),
                    }),
                },
            },
        ]
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "callable<{}>", self.name.lexeme)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "callable<{}>", self.name.lexeme)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn globals_table() {
        let globals = NativeFunction::get_globals();
        let names: Vec<String> = globals.iter().map(|native| native.name.lexeme.clone()).collect();

        assert_eq!(names, vec!["clock", "assert", "str", "getc", "chr", "exit"]);
    }

    #[test]
    fn str_builtin_formats_values() {
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);

        let globals = NativeFunction::get_globals();
        let str_fn = globals.iter().find(|native| native.name.lexeme == "str").unwrap();

        let result = str_fn.call(&mut interpreter, vec![Object::from(4.0)]).unwrap();
        assert_eq!(result, Object::from("4"));
    }

    #[test]
    fn chr_builtin_maps_bytes() {
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);

        let globals = NativeFunction::get_globals();
        let chr = globals.iter().find(|native| native.name.lexeme == "chr").unwrap();

        let result = chr.call(&mut interpreter, vec![Object::from(65.0)]).unwrap();
        assert_eq!(result, Object::from("A"));
    }

    #[test]
    fn assert_builtin_rejects_falsy() {
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);

        let globals = NativeFunction::get_globals();
        let assert_fn = globals.iter().find(|native| native.name.lexeme == "assert").unwrap();

        assert!(assert_fn.call(&mut interpreter, vec![Object::from(0.0)]).is_ok());
        assert!(assert_fn.call(&mut interpreter, vec![Object::from("")]).is_err());
    }

    #[test]
    fn display_tagged_form() {
        let globals = NativeFunction::get_globals();

        assert_eq!(globals[0].to_string(), "callable<clock>");
    }
}
