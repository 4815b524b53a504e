use crate::space::Instance;
use crate::types::{Distance, PointIdx};

/// Farthest-first traversal: starts with point 0 and repeatedly adds the point farthest away
/// from the centers chosen so far. Returns the (at most k) chosen point indices together with
/// the distance of every point to its closest chosen center.
pub(crate) fn gonzales_heuristic(space: &Instance, k: usize) -> (Vec<PointIdx>, Vec<Distance>) {
    let mut gonzales: Vec<PointIdx> = Vec::with_capacity(k);
    if space.n() == 0 || k == 0 {
        return (gonzales, vec![Distance::INFINITY; space.n()]);
    }

    // we can add any point as first center, so lets take 0
    gonzales.push(0);

    // current distance of point x to the set of already determined centers
    let mut dist_x_center: Vec<Distance> = (0..space.n()).map(|x| space.dist(0, x)).collect();

    for i in 1..k.min(space.n()) {
        let mut current_distance = Distance::MIN; // maximal distance to set of centers
        let mut current_point: Option<PointIdx> = None; // corresponding point with this max distance
        for j in 0..space.n() {
            // as distance of j to gonzales 0..i-2 is known, we only need to measure distance to newest center i-1.
            let dist_to_newest_center = space.dist(j, gonzales[i - 1]);
            if dist_to_newest_center < dist_x_center[j] {
                dist_x_center[j] = dist_to_newest_center;
            }
            if dist_x_center[j] > current_distance {
                current_distance = dist_x_center[j];
                current_point = Some(j);
            }
        }
        match current_point {
            Some(p) => gonzales.push(p),
            None => break,
        }
    }

    // include the last center
    if let Some(&last) = gonzales.last() {
        for (j, d) in dist_x_center.iter_mut().enumerate() {
            let dist_to_last = space.dist(j, last);
            if dist_to_last < *d {
                *d = dist_to_last;
            }
        }
    }
    (gonzales, dist_x_center)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_farthest_points() {
        let points = vec![vec![0.0], vec![1.0], vec![10.0], vec![5.0]];
        let membership = vec![vec![true]; 4];
        let space = Instance::new(points, membership).unwrap();
        let (centers, dist) = gonzales_heuristic(&space, 3);
        assert_eq!(centers, vec![0, 2, 3]);
        assert_eq!(dist, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn k_larger_than_n() {
        let space = Instance::new(vec![vec![0.0], vec![1.0]], vec![vec![true]; 2]).unwrap();
        let (centers, _) = gonzales_heuristic(&space, 5);
        assert_eq!(centers.len(), 2);
    }
}
