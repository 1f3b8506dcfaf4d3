//! End-to-end compilation scenarios spanning whole classes, exercising the
//! tokenizer, symbol table, and compilation engine together through the
//! public `jackc::compile_source` entry point.

use jackc::compile_source;
use std::path::Path;

fn compile(src: &str) -> String {
    compile_source(src, Path::new("Main.jack")).unwrap()
}

#[test]
fn two_methods_share_a_field_through_pointer_zero() {
    let vm = compile(
        "class Counter {
            field int count;

            constructor Counter new() {
                let count = 0;
                return this;
            }

            method void increment() {
                let count = count + 1;
                return;
            }

            method int get() {
                return count;
            }
        }",
    );

    assert!(vm.contains("function Counter.new 0"));
    assert!(vm.contains("call Memory.alloc 1"));
    assert!(vm.contains("function Counter.increment 0"));
    assert!(vm.contains("function Counter.get 0"));
    // Both methods bind `this` from argument 0 before touching the field.
    let incr_start = vm.find("function Counter.increment 0").unwrap();
    let incr_body = &vm[incr_start..];
    assert!(incr_body.starts_with("function Counter.increment 0\npush argument 0\npop pointer 0"));
}

#[test]
fn nested_if_while_and_array_access_in_one_function() {
    let vm = compile(
        "class Main {
            function void run() {
                var Array a;
                var int i;
                let a = Array.new(10);
                let i = 0;
                while (i < 10) {
                    if (i = 5) {
                        let a[i] = 100;
                    } else {
                        let a[i] = i;
                    }
                    let i = i + 1;
                }
                return;
            }
        }",
    );

    let while_tops: Vec<&str> = vm
        .lines()
        .filter(|l| l.starts_with("label WHILE_TOP_"))
        .collect();
    let while_ends: Vec<&str> = vm
        .lines()
        .filter(|l| l.starts_with("label WHILE_END_"))
        .collect();
    assert_eq!(while_tops.len(), 1);
    assert_eq!(while_ends.len(), 1);

    let if_elses: Vec<&str> = vm
        .lines()
        .filter(|l| l.starts_with("label IF_ELSE_"))
        .collect();
    let if_ends: Vec<&str> = vm
        .lines()
        .filter(|l| l.starts_with("label IF_END_"))
        .collect();
    assert_eq!(if_elses.len(), 1);
    assert_eq!(if_ends.len(), 1);

    // Every array write still follows the temp/pointer-1 dance.
    let pop_that_count = vm.lines().filter(|l| *l == "pop that 0").count();
    assert_eq!(pop_that_count, 2);
}

#[test]
fn string_constant_is_built_via_new_and_append_char_chain() {
    let vm = compile(
        "class Main {
            function void main() {
                do Output.printString(\"Hi\");
                return;
            }
        }",
    );
    assert!(vm.contains("push constant 2\ncall String.new 1"));
    assert!(vm.contains(&format!("push constant {}\ncall String.appendChar 2", 'H' as u32)));
    assert!(vm.contains(&format!("push constant {}\ncall String.appendChar 2", 'i' as u32)));
}

#[test]
fn static_dispatch_and_method_dispatch_coexist() {
    let vm = compile(
        "class Main {
            function void main() {
                var Main m;
                let m = Main.create();
                do m.greet();
                return;
            }

            function Main create() {
                return null;
            }

            method void greet() {
                return;
            }
        }",
    );
    assert!(vm.contains("call Main.create 0"));
    assert!(vm.contains("call Main.greet 1"));
}

#[test]
fn a_lexical_error_is_reported_with_file_and_line() {
    let err = compile_source("class Main {\n  let x = 1 @ 2;\n}", Path::new("Bad.jack"))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Bad.jack"));
    assert!(message.contains("lexical error"));
}
