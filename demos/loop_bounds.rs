use absint_rs::cfg::{ControlFlowGraph, Edge, EdgeKind, Node};
use absint_rs::engine::{BackwardInterpreter, ForwardInterpreter, Interpreter, InterpreterConfig};
use absint_rs::expressions::VariableIdentifier;
use absint_rs::interval_domain::IntervalState;
use absint_rs::semantics::{BackwardSemantics, ForwardSemantics};
use absint_rs::statements::{Operator, ProgramPoint, Statement};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    // 1: x = 0
    // 2: while x < 10:
    // 3:     x = x + 1
    // 4: print(x)
    let x = VariableIdentifier::int("x");
    let pp = |line| ProgramPoint::new(line, 0);
    let var = |line| Statement::variable(pp(line), x.clone());
    let condition = || Statement::binary(pp(2), var(2), Operator::Lt, Statement::int(pp(2), 10));

    let mut cfg = ControlFlowGraph::new(0).with_out_node(3);
    cfg.add_node(Node::basic(0, vec![Statement::assign(pp(1), var(1), Statement::int(pp(1), 0))]));
    cfg.add_node(Node::loop_header(1));
    cfg.add_node(Node::basic(
        2,
        vec![Statement::assign(
            pp(3),
            var(3),
            Statement::binary(pp(3), var(3), Operator::Add, Statement::int(pp(3), 1)),
        )],
    ));
    cfg.add_node(Node::basic(3, vec![Statement::print(pp(4), var(4))]));
    cfg.add_edge(Edge::unconditional(0, 1, EdgeKind::Default));
    cfg.add_edge(Edge::conditional(1, 2, EdgeKind::LoopIn, condition()));
    cfg.add_edge(Edge::unconditional(2, 1, EdgeKind::Default));
    cfg.add_edge(Edge::conditional(
        1,
        3,
        EdgeKind::LoopOut,
        Statement::call(pp(2), Operator::Not, vec![condition()]),
    ));
    println!("{}", cfg);

    let config = InterpreterConfig::default().with_widening_threshold(1);
    println!("config = {:?}", config);

    let time_forward = std::time::Instant::now();
    let forward = ForwardInterpreter::new(&cfg, &ForwardSemantics, config).analyze(IntervalState::new([x.clone()]))?;
    println!("Forward analysis in {:.3} s:", time_forward.elapsed().as_secs_f64());
    println!("{}", forward);

    let time_backward = std::time::Instant::now();
    let backward = BackwardInterpreter::new(&cfg, &BackwardSemantics, config).analyze(IntervalState::new([x.clone()]))?;
    println!("Backward analysis in {:.3} s:", time_backward.elapsed().as_secs_f64());
    println!("{}", backward);

    if let Some(state) = forward.get_result_before(pp(4)) {
        println!("x at print: {}", state);
    }

    Ok(())
}
