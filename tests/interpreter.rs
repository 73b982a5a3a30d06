use gust::{
    compiler,
    diagnostics::GustError,
    executor,
    parser,
    runtime::{Vm, MAX_CALL_DEPTH},
    value::{Value, ValueKind},
};

fn eval_in(vm: &mut Vm, source: &str) -> Result<Value, GustError> {
    let forms = parser::parse_all(source.as_bytes()).expect("source should parse");
    let mut last = Value::nil();
    for form in &forms {
        last = executor::execute(vm, form)?;
    }
    Ok(last)
}

fn eval(source: &str) -> Value {
    let mut vm = Vm::new();
    eval_in(&mut vm, source).expect("evaluation should succeed")
}

fn eval_error(source: &str) -> GustError {
    let mut vm = Vm::new();
    match eval_in(&mut vm, source) {
        Ok(value) => panic!("expected error, received value {value:?}"),
        Err(err) => err,
    }
}

fn expect_int(value: &Value) -> i64 {
    match value.0.as_ref() {
        ValueKind::Int(n) => *n,
        _ => panic!("expected int, found {}", value.type_name()),
    }
}

fn compile_message(source: &str) -> String {
    match eval_error(source) {
        GustError::Compile(diag) => diag.message,
        other => panic!("expected compiler error, got {other}"),
    }
}

#[test]
fn evaluates_basic_arithmetic() {
    assert_eq!(expect_int(&eval("(+ 1 2)")), 3);
    assert_eq!(expect_int(&eval("(- 10 4 1)")), 5);
    assert_eq!(expect_int(&eval("(- 7)")), -7);
    assert_eq!(expect_int(&eval("(* 2 3 4)")), 24);
    assert_eq!(expect_int(&eval("(/ 12 4)")), 3);
    assert_eq!(eval("(/ 7 2)"), Value::float(3.5));
    assert_eq!(eval("(+ 1 0.5)"), Value::float(1.5));
    assert_eq!(expect_int(&eval("(% 7 3)")), 1);
}

#[test]
fn previous_result_is_bound_as_underscore() {
    let value = eval("(+ 1 2)\n(+ 3 4)\n(* _ 10)");
    assert_eq!(expect_int(&value), 70);
}

#[test]
fn failed_form_leaves_previous_result_alone() {
    let mut vm = Vm::new();
    eval_in(&mut vm, "(+ 20 22)").expect("first form runs");
    let err = eval_in(&mut vm, "(error \"boom\")").expect_err("second form fails");
    assert!(matches!(err, GustError::Runtime(_)));
    let err = eval_in(&mut vm, "(undefined-thing)").expect_err("third form fails to compile");
    assert!(matches!(err, GustError::Compile(_)));
    assert_eq!(expect_int(vm.previous()), 42);
    assert_eq!(expect_int(&eval_in(&mut vm, "_").expect("reads binding")), 42);
}

#[test]
fn definitions_persist_between_forms() {
    let value = eval(
        r#"
        (def base 40)
        (def add (fn [a b] (+ a b)))
        (add base 2)
        "#,
    );
    assert_eq!(expect_int(&value), 42);
}

#[test]
fn recursion_through_global_definition() {
    let value = eval(
        r#"
        (def fact (fn [n] (if (<= n 1) 1 (* n (fact (- n 1))))))
        (fact 10)
        "#,
    );
    assert_eq!(expect_int(&value), 3_628_800);
}

#[test]
fn named_functions_can_call_themselves() {
    let value = eval("((fn fib [n] (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))) 15)");
    assert_eq!(expect_int(&value), 610);
}

#[test]
fn closures_capture_their_environment() {
    let value = eval(
        r#"
        (def make-counter (fn [start]
          (var count start)
          (fn [] (set count (+ count 1)) count)))
        (def tick (make-counter 5))
        (tick)
        (tick)
        "#,
    );
    assert_eq!(expect_int(&value), 7);
}

#[test]
fn while_loop_accumulates() {
    let value = eval(
        r#"
        (var i 0)
        (var sum 0)
        (while (< i 5)
          (set sum (+ sum i))
          (set i (+ i 1)))
        sum
        "#,
    );
    assert_eq!(expect_int(&value), 10);
}

#[test]
fn collections_and_quote() {
    assert_eq!(
        eval("(push [1 2] 3)"),
        Value::array(vec![Value::int(1), Value::int(2), Value::int(3)])
    );
    assert_eq!(expect_int(&eval("(get {a 1 b 2} 'b)")), 2);
    assert_eq!(expect_int(&eval("(len (put {a 1} \"c\" 3))")), 2);
    assert_eq!(eval("(get [1 2] 9)"), Value::nil());
    assert_eq!(
        eval("'(a 1)"),
        Value::array(vec![Value::symbol("a"), Value::int(1)])
    );
    assert_eq!(eval("(str \"n=\" 4)"), Value::string("n=4"));
    assert_eq!(eval("(type 1.5)"), Value::symbol("float"));
}

#[test]
fn rendering_quotes_strings() {
    let vm = Vm::new();
    assert_eq!(vm.render(&Value::string("hi")), "\"hi\"");
    assert_eq!(
        vm.render(&Value::array(vec![Value::int(1), Value::string("x")])),
        "[1 \"x\"]"
    );
    assert_eq!(vm.render(&Value::nil()), "nil");
}

#[test]
fn compiler_rejects_malformed_special_forms() {
    for (source, needle) in [
        ("(if)", "`if` expects 2 or 3 arguments"),
        ("(def 1 2)", "expects a symbol"),
        ("(def if 2)", "cannot rebind special form"),
        ("(fn x)", "parameter array"),
        ("(fn [a a] a)", "duplicate parameter"),
        ("(quote)", "`quote` expects 1 argument"),
        ("()", "empty form"),
        ("(def x 1)\n(set x 2)", "cannot set immutable binding"),
        ("(set nowhere 2)", "undefined symbol `nowhere`"),
        ("(+ 1 missing)", "undefined symbol `missing`"),
        ("(fn [] while)", "cannot be used as a value"),
    ] {
        let message = compile_message(source);
        assert!(
            message.contains(needle),
            "{source}: `{message}` does not mention `{needle}`"
        );
    }
}

#[test]
fn runtime_errors_are_values() {
    match eval_error("(error \"boom\")") {
        GustError::Runtime(value) => assert_eq!(value, Value::string("boom")),
        other => panic!("expected runtime error, got {other}"),
    }
    for (source, needle) in [
        ("(+ 1 \"a\")", "expected number"),
        ("(/ 1 0)", "division by zero"),
        ("(* 9223372036854775807 2)", "integer overflow"),
        ("(1 2)", "not callable"),
        ("((fn [a] a))", "expected 1 arguments"),
        ("(len 4)", "`len` expects"),
    ] {
        match eval_error(source) {
            GustError::Runtime(value) => assert!(
                value.to_string().contains(needle),
                "{source}: `{value}` does not mention `{needle}`"
            ),
            other => panic!("{source}: expected runtime error, got {other}"),
        }
    }
}

#[test]
fn runaway_recursion_crashes_the_vm() {
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| eval_error("(def loop (fn [n] (loop (+ n 1))))\n(loop 0)").to_string())
        .expect("spawn test thread");
    let message = handle.join().expect("thread finishes");
    assert_eq!(message, "VM crash: stack overflow");
    assert!(MAX_CALL_DEPTH > 100);
}

#[test]
fn compile_does_not_run_anything() {
    let vm = Vm::new();
    let form = parser::parse_all(b"(def never 1)").expect("parses").remove(0);
    compiler::compile(&form, vm.globals()).expect("compiles");
    assert!(vm.global("never").is_none());
}

#[test]
fn dropping_the_vm_frees_global_closures() {
    let mut vm = Vm::new();
    assert!(!vm.globals().borrow().is_empty());
    let _ = eval_in(&mut vm, "(def counter (fn [] counter))\n(def later (counter))");
    let globals = std::rc::Rc::downgrade(vm.globals());
    drop(vm);
    assert!(globals.upgrade().is_none());
}
