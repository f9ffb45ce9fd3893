// This file has code from https://github.com/LIHPC-Computational-Geometry/coupe

/// Calculates the total weight for each part of a given partition.
pub fn compute_parts_load(partition: &[usize], num_parts: usize, weights: &[f64]) -> Vec<f64> {
    let mut loads = vec![0.0; num_parts];

    for (&part, w) in partition.iter().zip(weights) {
        if part < num_parts {
            loads[part] += w;
        }
    }

    loads
}

/// Compute imbalance after passing part loads.
pub fn compute_imbalance_from_part_loads(num_parts: usize, part_loads: &[f64]) -> f64 {
    let total_weight: f64 = part_loads.iter().sum();

    let ideal_part_weight = total_weight / num_parts as f64;
    if ideal_part_weight == 0.0 {
        return 0.0;
    }

    part_loads
        .iter()
        .map(|part_weight| (part_weight - ideal_part_weight) / ideal_part_weight)
        .fold(0.0f64, |acc, dev| acc.max(dev))
}

/// Compute the imbalance of the given partition.
pub fn imbalance(num_parts: usize, partition: &[usize], weights: &[f64]) -> f64 {
    if num_parts == 0 {
        return 0.0;
    }

    let part_loads = compute_parts_load(partition, num_parts, weights);

    compute_imbalance_from_part_loads(num_parts, &part_loads)
}
