use std::io::{self, Write};

use indexmap::IndexMap;

use crate::{
    environment::EnvironmentRef,
    runtime::Fault,
    value::{NativeFunction, Value, ValueKind},
};

type Result<T> = std::result::Result<T, Fault>;

const VARIADIC: usize = usize::MAX;

pub fn install(env: &EnvironmentRef) {
    let natives = [
        native("+", VARIADIC, math_add),
        native("-", VARIADIC, math_sub),
        native("*", VARIADIC, math_mul),
        native("/", VARIADIC, math_div),
        native("%", 2, math_rem),
        native("=", VARIADIC, compare_equal),
        native("not=", VARIADIC, compare_not_equal),
        native("<", VARIADIC, compare_less),
        native(">", VARIADIC, compare_greater),
        native("<=", VARIADIC, compare_less_equal),
        native(">=", VARIADIC, compare_greater_equal),
        native("not", 1, logic_not),
        native("print", VARIADIC, io_print),
        native("error", 1, runtime_error),
        native("type", 1, runtime_type),
        native("str", VARIADIC, string_concat),
        native("array", VARIADIC, collections_array),
        native("table", VARIADIC, collections_table),
        native("len", 1, collections_len),
        native("get", 2, collections_get),
        native("put", 3, collections_put),
        native("push", 2, collections_push),
    ];

    let mut scope = env.borrow_mut();
    for (name, value) in natives {
        scope.define(name, value, false);
    }
}

fn native(
    name: &'static str,
    arity: usize,
    callback: fn(&[Value]) -> Result<Value>,
) -> (&'static str, Value) {
    let value = Value::new(ValueKind::NativeFunction(NativeFunction {
        name,
        arity,
        callback,
    }));
    (name, value)
}

fn ensure_min(args: &[Value], min: usize, name: &str) -> Result<()> {
    if args.len() < min {
        return Err(Fault::error(format!(
            "`{name}` expected at least {min} arguments but received {}",
            args.len()
        )));
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_float(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(n) => Value::int(n),
            Number::Float(n) => Value::float(n),
        }
    }
}

fn expect_number(value: &Value, name: &str) -> Result<Number> {
    match &*value.0 {
        ValueKind::Int(n) => Ok(Number::Int(*n)),
        ValueKind::Float(f) => Ok(Number::Float(*f)),
        _ => Err(Fault::error(format!(
            "`{name}` expected number but found {}",
            value.type_name()
        ))),
    }
}

fn expect_int(value: &Value, name: &str) -> Result<i64> {
    value.as_int().ok_or_else(|| {
        Fault::error(format!(
            "`{name}` expected int but found {}",
            value.type_name()
        ))
    })
}

fn arithmetic(
    name: &str,
    left: Number,
    right: Number,
    checked: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Number> {
    match (left, right) {
        (Number::Int(a), Number::Int(b)) => checked(a, b)
            .map(Number::Int)
            .ok_or_else(|| Fault::error(format!("integer overflow in `{name}`"))),
        (a, b) => Ok(Number::Float(float(a.as_float(), b.as_float()))),
    }
}

fn fold(
    args: &[Value],
    name: &str,
    checked: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Number> {
    let mut numbers = args.iter().map(|arg| expect_number(arg, name));
    let mut acc = match numbers.next() {
        Some(first) => first?,
        None => return Err(Fault::error(format!("`{name}` needs at least one argument"))),
    };
    for number in numbers {
        acc = arithmetic(name, acc, number?, checked, float)?;
    }
    Ok(acc)
}

fn math_add(args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::int(0));
    }
    fold(args, "+", i64::checked_add, |a, b| a + b).map(Number::into_value)
}

fn math_mul(args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::int(1));
    }
    fold(args, "*", i64::checked_mul, |a, b| a * b).map(Number::into_value)
}

fn math_sub(args: &[Value]) -> Result<Value> {
    ensure_min(args, 1, "-")?;
    if let [only] = args {
        let operand = expect_number(only, "-")?;
        let negated = arithmetic("-", Number::Int(0), operand, i64::checked_sub, |a, b| a - b)?;
        return Ok(negated.into_value());
    }
    fold(args, "-", i64::checked_sub, |a, b| a - b).map(Number::into_value)
}

fn math_div(args: &[Value]) -> Result<Value> {
    ensure_min(args, 2, "/")?;
    let mut acc = expect_number(&args[0], "/")?;
    for arg in &args[1..] {
        let divisor = expect_number(arg, "/")?;
        acc = match (acc, divisor) {
            (_, Number::Int(0)) => return Err(Fault::error("division by zero")),
            (Number::Int(a), Number::Int(b)) if a.checked_rem(b) == Some(0) => Number::Int(a / b),
            (a, b) => Number::Float(a.as_float() / b.as_float()),
        };
    }
    Ok(acc.into_value())
}

fn math_rem(args: &[Value]) -> Result<Value> {
    let a = expect_int(&args[0], "%")?;
    let b = expect_int(&args[1], "%")?;
    if b == 0 {
        return Err(Fault::error("division by zero"));
    }
    Ok(Value::int(a.wrapping_rem(b)))
}

fn compare_equal(args: &[Value]) -> Result<Value> {
    Ok(Value::bool(args.windows(2).all(|pair| pair[0] == pair[1])))
}

fn compare_not_equal(args: &[Value]) -> Result<Value> {
    Ok(Value::bool(!args.windows(2).all(|pair| pair[0] == pair[1])))
}

fn chain(args: &[Value], name: &str, holds: fn(f64, f64) -> bool) -> Result<Value> {
    ensure_min(args, 1, name)?;
    for pair in args.windows(2) {
        let left = expect_number(&pair[0], name)?.as_float();
        let right = expect_number(&pair[1], name)?.as_float();
        if !holds(left, right) {
            return Ok(Value::bool(false));
        }
    }
    Ok(Value::bool(true))
}

fn compare_less(args: &[Value]) -> Result<Value> {
    chain(args, "<", |a, b| a < b)
}

fn compare_greater(args: &[Value]) -> Result<Value> {
    chain(args, ">", |a, b| a > b)
}

fn compare_less_equal(args: &[Value]) -> Result<Value> {
    chain(args, "<=", |a, b| a <= b)
}

fn compare_greater_equal(args: &[Value]) -> Result<Value> {
    chain(args, ">=", |a, b| a >= b)
}

fn logic_not(args: &[Value]) -> Result<Value> {
    Ok(Value::bool(!args[0].is_truthy()))
}

fn io_print(args: &[Value]) -> Result<Value> {
    let line = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(io::stdout().lock(), "{line}")
        .map_err(|err| Fault::error(format!("`print` failed: {err}")))?;
    Ok(Value::nil())
}

fn runtime_error(args: &[Value]) -> Result<Value> {
    Err(Fault::Error(args[0].clone()))
}

fn runtime_type(args: &[Value]) -> Result<Value> {
    Ok(Value::symbol(args[0].type_name()))
}

fn string_concat(args: &[Value]) -> Result<Value> {
    Ok(Value::string(
        args.iter().map(|arg| arg.to_string()).collect::<String>(),
    ))
}

fn collections_array(args: &[Value]) -> Result<Value> {
    Ok(Value::array(args.to_vec()))
}

fn collections_table(args: &[Value]) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(Fault::error("`table` expects key/value pairs"));
    }
    let mut table = IndexMap::new();
    for pair in args.chunks(2) {
        table.insert(table_key(&pair[0], "table")?, pair[1].clone());
    }
    Ok(Value::table(table))
}

fn table_key(value: &Value, name: &str) -> Result<String> {
    value.table_key().ok_or_else(|| {
        Fault::error(format!(
            "`{name}` cannot use {} as a table key",
            value.type_name()
        ))
    })
}

fn array_index(index: &Value, len: usize, name: &str) -> Result<Option<usize>> {
    let index = expect_int(index, name)?;
    Ok(usize::try_from(index).ok().filter(|idx| *idx < len))
}

fn collections_len(args: &[Value]) -> Result<Value> {
    let value = &args[0];
    let len = match &*value.0 {
        ValueKind::String(s) => s.chars().count(),
        ValueKind::Array(values) => values.len(),
        ValueKind::Table(table) => table.len(),
        _ => {
            return Err(Fault::error(format!(
                "`len` expects string, array, or table but found {}",
                value.type_name()
            )));
        }
    };
    Ok(Value::int(len as i64))
}

fn collections_get(args: &[Value]) -> Result<Value> {
    let found = match &*args[0].0 {
        ValueKind::Array(values) => {
            array_index(&args[1], values.len(), "get")?.map(|idx| values[idx].clone())
        }
        ValueKind::Table(table) => table.get(&table_key(&args[1], "get")?).cloned(),
        ValueKind::String(text) => {
            let idx = expect_int(&args[1], "get")?;
            usize::try_from(idx)
                .ok()
                .and_then(|idx| text.chars().nth(idx))
                .map(|ch| Value::string(ch.to_string()))
        }
        _ => {
            return Err(Fault::error(format!(
                "`get` expects array, table, or string but found {}",
                args[0].type_name()
            )));
        }
    };
    Ok(found.unwrap_or_else(Value::nil))
}

fn collections_put(args: &[Value]) -> Result<Value> {
    match &*args[0].0 {
        ValueKind::Array(values) => {
            let idx = array_index(&args[1], values.len(), "put")?
                .ok_or_else(|| Fault::error(format!("index {} out of bounds", args[1])))?;
            let mut updated = values.clone();
            updated[idx] = args[2].clone();
            Ok(Value::array(updated))
        }
        ValueKind::Table(table) => {
            let mut updated = table.clone();
            updated.insert(table_key(&args[1], "put")?, args[2].clone());
            Ok(Value::table(updated))
        }
        _ => Err(Fault::error(format!(
            "`put` expects array or table but found {}",
            args[0].type_name()
        ))),
    }
}

fn collections_push(args: &[Value]) -> Result<Value> {
    match &*args[0].0 {
        ValueKind::Array(values) => {
            let mut updated = values.clone();
            updated.push(args[1].clone());
            Ok(Value::array(updated))
        }
        _ => Err(Fault::error(format!(
            "`push` expects array but found {}",
            args[0].type_name()
        ))),
    }
}
