//! Training Run Example
//!
//! Builds a run log, trains a softmax-regression graph on a synthetic
//! dataset, logs summaries, and persists the run log.
//!
//! Run with: cargo run --example train_run -- [config.json]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trueno_trainkit::graph::{Graph, Tensor};
use trueno_trainkit::ops::{
    create_eval_ops, create_keep_probs, create_placeholders, create_summary_ops, create_train_ops,
};
use trueno_trainkit::run::{save_log, RunConfig, RunLog};
use trueno_trainkit::session::{session_config, Feed, Session};

const INPUT_SIZE: usize = 8;
const CLASSES: usize = 6;

fn synthetic_batch(rows: usize, rng: &mut StdRng) -> anyhow::Result<(Tensor, Tensor)> {
    let labels: Vec<usize> = (0..rows).map(|_| rng.gen_range(0..CLASSES)).collect();
    let mut x = Tensor::random_uniform(&[rows, INPUT_SIZE], 0.0, 0.3, rng);
    let mut data = x.data().to_vec();
    for (row, &label) in labels.iter().enumerate() {
        data[row * INPUT_SIZE + label] += 1.0;
    }
    x = Tensor::new(vec![rows, INPUT_SIZE], data)?;
    Ok((x, Tensor::one_hot(&labels, CLASSES)?))
}

fn main() -> anyhow::Result<()> {
    trueno_trainkit::logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => RunConfig::from_path(path)?,
        None => RunConfig::builder()
            .run_name("demo-softmax")
            .dataset("synthetic")
            .model("softmax-regression")
            .procedure("adam")
            .commit("0000000")
            .rng_seed(7)
            .epochs(200)
            .train_batch_size(32)
            .test_batch_size(64)
            .eval_interval(50)
            .checkpoint_interval(100)
            .build(),
    };
    let mut log = RunLog::from_config_or_exit(&config)?;

    let seed = u64::from_ne_bytes(config.rng_seed().to_ne_bytes());
    let mut rng = StdRng::seed_from_u64(seed);

    let mut graph = Graph::new();
    let (inputs, labels) = create_placeholders(&mut graph, INPUT_SIZE, CLASSES);
    let (keep_prob_input, keep_prob) = create_keep_probs(&mut graph);
    let w = graph.variable(
        "weights",
        Tensor::random_uniform(&[INPUT_SIZE, CLASSES], -0.1, 0.1, &mut rng),
    );
    let b = graph.variable("biases", Tensor::zeros(&[CLASSES]));
    let xw = graph.matmul(inputs, w)?;
    let logits = graph.add(xw, b)?;

    let train = create_train_ops(&mut graph, logits, labels)?;
    let eval = create_eval_ops(&mut graph, logits, labels)?;
    let summaries = create_summary_ops(&mut graph, train.loss, eval.accuracy, eval.top5_accuracy)?;

    let mut session = Session::new(&graph, session_config(false));
    let (test_x, test_y) = synthetic_batch(usize::try_from(config.test_batch_size())?, &mut rng)?;
    let test_feed = Feed::new()
        .with(inputs, test_x)
        .with(labels, test_y)
        .with(keep_prob_input, Tensor::scalar(1.0))
        .with(keep_prob, Tensor::scalar(1.0));

    for step in 1..=config.epochs() {
        let (x, y) = synthetic_batch(usize::try_from(config.train_batch_size())?, &mut rng)?;
        let feed = Feed::new().with(inputs, x).with(labels, y);
        session.run(&[train.train_step], &feed)?;

        if config.eval_interval() > 0 && step % config.eval_interval() == 0 {
            let out = session.run(&[summaries], &test_feed)?;
            if let Some(summary) = out[0].as_summary() {
                tracing::info!(step, summary = %serde_json::to_string(summary)?, "eval");
            }
        }
    }

    let path = save_log(&mut log, "summaries", config.run_name(), "log.json")?;
    tracing::info!(path = %path.display(), "run log written");
    Ok(())
}
