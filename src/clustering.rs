//////////////////////////////////////////////////////////////
//////////////////// module: clustering //////////////////////
//////////////////////////////////////////////////////////////

/// A set of centers S given by their coordinates. Centers are copied out of the instance,
/// so a [Centers] outlives the partition it was chosen from.
///
use crate::error::FairKMedianError;
use crate::space::euclidean;
use crate::types::{Distance, PointCount};

use std::fs::File;
use std::io::prelude::*;

pub type CenterIdx = usize;

/// A list of centers, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Centers {
    coordinates: Vec<f64>,
    dim: usize,
}

impl Centers {
    /// Creates a new empty list of centers of dimension dim. The capacity is used to allocate
    /// enough storage on the heap.
    pub fn with_capacity(capacity: PointCount, dim: usize) -> Centers {
        Centers {
            coordinates: Vec::with_capacity(capacity * dim),
            dim,
        }
    }

    /// Creates centers from arbitrary rows.
    ///
    /// # Errors
    ///
    /// Returns [FairKMedianError::InvalidDimensions] if a row has not dimension dim.
    pub fn from_rows(rows: &[Vec<f64>], dim: usize) -> Result<Centers, FairKMedianError> {
        let mut centers = Centers::with_capacity(rows.len(), dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(FairKMedianError::InvalidDimensions(format!(
                    "Center {} has dimension {}, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            centers.coordinates.extend_from_slice(row);
        }
        Ok(centers)
    }

    /// Returns the number of centers m.
    pub fn m(&self) -> PointCount {
        if self.dim == 0 {
            0
        } else {
            self.coordinates.len() / self.dim
        }
    }

    /// Returns the dimension of the centers.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return the center of index i (from 0 to m-1)
    pub fn get(&self, i: CenterIdx) -> &[f64] {
        &self.coordinates[i * self.dim..(i + 1) * self.dim]
    }

    /// Provides an iterator of the centers.
    pub fn iter(&self) -> std::slice::ChunksExact<'_, f64> {
        self.coordinates.chunks_exact(self.dim.max(1))
    }

    /// Distance of x to the closest center.
    pub fn dist_to_closest(&self, x: &[f64]) -> Distance {
        self.iter()
            .map(|c| euclidean(x, c))
            .fold(Distance::INFINITY, Distance::min)
    }

    /// Save the centers to a file specified by file_path.
    /// The output file contains one line per center with its coordinates separated by a comma.
    ///
    /// Example:
    ///
    /// ```txt
    /// -8.19,-7.88
    /// 1.52,3.7
    /// ```
    pub fn save_to_file(&self, file_path: &str) -> std::io::Result<()> {
        let mut f = File::create(file_path)?;
        let mut text = String::new();
        for c in self.iter() {
            let line: Vec<String> = c.iter().map(|x| format!("{}", x)).collect();
            text.push_str(&line.join(","));
            text.push('\n');
        }
        text.pop(); //delete last newline
        f.write_all(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_center() {
        let centers = Centers::from_rows(&[vec![0.0, 0.0], vec![10.0, 0.0]], 2).unwrap();
        assert_eq!(centers.m(), 2);
        assert_eq!(centers.dist_to_closest(&[7.0, 4.0]), 5.0);
        assert_eq!(centers.get(1), &[10.0, 0.0]);
    }

    #[test]
    fn rejects_wrong_width() {
        let err = Centers::from_rows(&[vec![0.0, 0.0], vec![1.0]], 2);
        assert!(matches!(err, Err(FairKMedianError::InvalidDimensions(_))));
    }

    #[test]
    fn save_and_read_back() {
        let centers = Centers::from_rows(&[vec![1.5, -2.0], vec![3.0, 4.25]], 2).unwrap();
        let path = std::env::temp_dir().join("fair_k_median_centers_test.csv");
        let path = path.to_str().unwrap();
        centers.save_to_file(path).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "1.5,-2\n3,4.25");
        let _ = std::fs::remove_file(path);
    }
}
