//! Sufficient statistics and GMM training on a simple 2D dataset.

use gmix::{GaussianMixtureModel, SufficientStatistics};

fn main() {
    // Two well-separated clusters in 2D.
    let data: Vec<Vec<f64>> = vec![
        // Cluster A (near origin)
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![0.2, 0.1],
        vec![-0.1, 0.1],
        vec![0.15, -0.05],
        // Cluster B (near (5, 5))
        vec![5.0, 5.0],
        vec![5.1, 4.9],
        vec![4.9, 5.1],
        vec![5.2, 5.2],
        vec![5.05, 4.85],
    ];

    // --- Mergeable statistics over a partition of the dataset ---
    let (first_half, second_half) = data.split_at(5);
    let mut left = SufficientStatistics::new(2);
    let mut right = SufficientStatistics::new(2);
    for row in first_half {
        left.add_sample(row).unwrap();
    }
    for row in second_half {
        right.add_sample(row).unwrap();
    }
    left.add_statistics(&right).unwrap();

    println!("=== Merged sufficient statistics ===");
    println!("  mean       = {:?}", left.mean());
    println!("  covariance = {:?}", left.covariance());

    // --- EM training (k=2) ---
    let mut model = GaussianMixtureModel::new(2, 2).unwrap().with_seed(42);
    let mut epochs = 0;
    for epoch in 1..=100 {
        model.train(&data).unwrap();
        let score = model.maximize_parameters().unwrap();
        epochs = epoch;
        if model.has_converged() {
            println!("\nconverged after {} epochs (log-likelihood {:.4})", epochs, score);
            break;
        }
    }
    if !model.has_converged() {
        println!("\nstopped after {} epochs without convergence", epochs);
    }

    println!("\n=== Fitted mixtures ===");
    for m in model.mixtures() {
        println!(
            "  cluster {}: weight {:.3}, mean ({:.2}, {:.2})",
            m.id, m.weight, m.mean[0], m.mean[1]
        );
    }

    println!("\n=== Assignments ===");
    for (i, row) in data.iter().enumerate() {
        let label = model.get_cluster(row).unwrap();
        let on_x_only = model.get_marginal_cluster(&[0], &[row[0]]).unwrap();
        println!(
            "  point {:2} ({:5.2}, {:5.2}) => cluster {} (x-axis alone: {})",
            i, row[0], row[1], label, on_x_only
        );
    }
}
