//! Program fixtures
//!
//! Node ids are `method:index`; every method body ends in a return, which
//! the builder appends when missing.

use codegraph_ideal::{ProgramBuilder, ProgramGraph, StmtKind};

/// `File.open` / `File.close` as library methods with (empty) bodies
fn file_class(builder: &mut ProgramBuilder) {
    builder
        .method("File.open")
        .instance()
        .library()
        .stmt(StmtKind::nop());
    builder
        .method("File.close")
        .instance()
        .library()
        .stmt(StmtKind::nop());
}

/// ```text
/// 0: a = new File()
/// 1: b = a
/// 2: b.open()
/// 3: a.close()
/// 4: return
/// ```
pub fn file_closed_through_alias() -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    file_class(&mut builder);
    builder
        .method("main")
        .stmt(StmtKind::new_object("a", "File"))
        .stmt(StmtKind::assign("b", "a"))
        .stmt(StmtKind::call_method("b", "File.open"))
        .stmt(StmtKind::call_method("a", "File.close"))
        .stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}

/// ```text
/// 0: a = new File()
/// 1: b = a
/// 2: b.open()
/// 3: return
/// ```
pub fn file_left_open() -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    file_class(&mut builder);
    builder
        .method("main")
        .stmt(StmtKind::new_object("a", "File"))
        .stmt(StmtKind::assign("b", "a"))
        .stmt(StmtKind::call_method("b", "File.open"))
        .stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}

/// Same shape as [`file_closed_through_alias`], but `File.close` has no body
pub fn file_closed_by_library_call() -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    builder
        .method("File.open")
        .instance()
        .library()
        .stmt(StmtKind::nop());
    builder.library_method("File.close");
    builder
        .method("main")
        .stmt(StmtKind::new_object("a", "File"))
        .stmt(StmtKind::assign("b", "a"))
        .stmt(StmtKind::call_method("b", "File.open"))
        .stmt(StmtKind::call_method("a", "File.close"))
        .stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}

/// Two independent files, only `c` is closed
///
/// ```text
/// 0: a = new File()
/// 1: c = new File()
/// 2: a.open()
/// 3: c.open()
/// 4: c.close()
/// 5: return
/// ```
pub fn two_files() -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    file_class(&mut builder);
    builder
        .method("main")
        .stmt(StmtKind::new_object("a", "File"))
        .stmt(StmtKind::new_object("c", "File"))
        .stmt(StmtKind::call_method("a", "File.open"))
        .stmt(StmtKind::call_method("c", "File.open"))
        .stmt(StmtKind::call_method("c", "File.close"))
        .stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}

/// Open and close inside a loop
///
/// ```text
/// 0: a = new File()
/// 1: a.open()
/// 2: a.close()
/// 3: if k == null goto 1
/// 4: return
/// ```
pub fn file_in_loop() -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    file_class(&mut builder);
    builder
        .method("main")
        .stmt(StmtKind::new_object("a", "File"))
        .stmt(StmtKind::call_method("a", "File.open"))
        .stmt(StmtKind::call_method("a", "File.close"))
        .stmt(StmtKind::if_null("k", 1))
        .stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}

/// `flow.flow(file)` dispatches to an implementation that opens and one
/// that closes
///
/// ```text
/// main:  0: file = new File()
///        1: flow.flow(file)      -> ImplFlow1.flow | ImplFlow2.flow
///        2: return
/// ImplFlow1.flow(file): file.open()
/// ImplFlow2.flow(file): file.close()
/// ```
pub fn interface_dispatch() -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    file_class(&mut builder);
    builder
        .method("ImplFlow1.flow")
        .instance()
        .param("file")
        .stmt(StmtKind::call_method("file", "File.open"));
    builder
        .method("ImplFlow2.flow")
        .instance()
        .param("file")
        .stmt(StmtKind::call_method("file", "File.close"));
    builder
        .method("main")
        .stmt(StmtKind::new_object("file", "File"))
        .stmt(StmtKind::invoke(
            Some("flow"),
            &["ImplFlow1.flow", "ImplFlow2.flow"],
            &["file"],
            None,
        ))
        .stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}

/// The close is skipped on the branch where `guard` is null
///
/// ```text
/// 0: a = new File()
/// 1: a.open()
/// 2: if guard == null goto 4
/// 3: a.close()
/// 4: return
/// ```
pub fn guarded_close(guard: &str) -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    file_class(&mut builder);
    builder
        .method("main")
        .stmt(StmtKind::new_object("a", "File"))
        .stmt(StmtKind::call_method("a", "File.open"))
        .stmt(StmtKind::if_null(guard, 4))
        .stmt(StmtKind::call_method("a", "File.close"))
        .stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}

/// The file is allocated and opened in a factory and closed by its caller
///
/// ```text
/// make: 0: x = new File()
///       1: x.open()
///       2: return x
/// main: 0: f = make()
///       1: f.close()
///       2: return
/// ```
pub fn file_from_factory() -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    file_class(&mut builder);
    builder
        .method("make")
        .stmt(StmtKind::new_object("x", "File"))
        .stmt(StmtKind::call_method("x", "File.open"))
        .stmt(StmtKind::ret(Some("x")));
    builder
        .method("main")
        .stmt(StmtKind::invoke(None, &["make"], &[], Some("f")))
        .stmt(StmtKind::call_method("f", "File.close"))
        .stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}

/// ```text
/// 0: s = new PrintStream()
/// 1: s.close()
/// 2: s.println()
/// 3: return
/// ```
pub fn print_stream_used_after_close() -> ProgramGraph {
    print_stream(&["PrintStream.close", "PrintStream.println"])
}

/// ```text
/// 0: s = new PrintStream()
/// 1: s.println()
/// 2: s.close()
/// 3: return
/// ```
pub fn print_stream_closed_last() -> ProgramGraph {
    print_stream(&["PrintStream.println", "PrintStream.close"])
}

fn print_stream(calls: &[&str]) -> ProgramGraph {
    let mut builder = ProgramBuilder::new();
    builder.library_method("PrintStream.close");
    builder.library_method("PrintStream.println");
    let main = builder
        .method("main")
        .stmt(StmtKind::new_object("s", "PrintStream"));
    for call in calls {
        main.stmt(StmtKind::call_method("s", call));
    }
    main.stmt(StmtKind::ret(None));
    builder.entry("main");
    builder.build().unwrap()
}
