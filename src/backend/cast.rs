//! Conversions between the OpenCV types the backend speaks and the
//! nalgebra/ndarray types the pipeline speaks.

use nalgebra::{Matrix3, Point2, Vector3};
use ndarray::Array2;
use opencv::core::{KeyPoint, Mat, Point2d, Scalar, Vector, CV_64F, CV_8UC4};
use opencv::prelude::*;

use crate::global_types::Frame;

/// RGBA frame buffer → grayscale Mat, orientation-corrected per the frame's
/// clockwise rotation hint.
pub fn gray_from_rgba(frame: &Frame<'_>) -> opencv::Result<Mat> {
    let mut rgba = Mat::new_rows_cols_with_default(
        frame.height as i32,
        frame.width as i32,
        CV_8UC4,
        Scalar::all(0.0),
    )?;
    rgba.data_bytes_mut()?.copy_from_slice(frame.pixels);

    let mut gray = Mat::default();
    opencv::imgproc::cvt_color(&rgba, &mut gray, opencv::imgproc::COLOR_RGBA2GRAY, 0)?;

    let code = match frame.rotation_degrees.rem_euclid(360) {
        90 => Some(opencv::core::ROTATE_90_CLOCKWISE),
        180 => Some(opencv::core::ROTATE_180),
        270 => Some(opencv::core::ROTATE_90_COUNTERCLOCKWISE),
        _ => None,
    };
    match code {
        Some(code) => {
            let mut rotated = Mat::default();
            opencv::core::rotate(&gray, &mut rotated, code)?;
            Ok(rotated)
        }
        None => Ok(gray),
    }
}

pub fn keypoints_to_points(keypoints: &Vector<KeyPoint>) -> Vec<Point2<f64>> {
    keypoints
        .iter()
        .map(|kp| {
            let pt = kp.pt();
            Point2::new(pt.x as f64, pt.y as f64)
        })
        .collect()
}

pub fn points_to_vector(points: &[Point2<f64>]) -> Vector<Point2d> {
    points.iter().map(|p| Point2d::new(p.x, p.y)).collect()
}

pub fn descriptors_to_array(mat: &Mat) -> opencv::Result<Array2<f32>> {
    let rows = mat.rows();
    let cols = mat.cols();
    let mut array = Array2::<f32>::zeros((rows.max(0) as usize, cols.max(0) as usize));
    for i in 0..rows {
        for j in 0..cols {
            array[(i as usize, j as usize)] = *mat.at_2d::<f32>(i, j)?;
        }
    }
    Ok(array)
}

pub fn array_to_mat(array: &Array2<f32>) -> opencv::Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        array.nrows() as i32,
        array.ncols() as i32,
        opencv::core::CV_32F,
        Scalar::all(0.0),
    )?;
    for i in 0..array.nrows() {
        for j in 0..array.ncols() {
            *mat.at_2d_mut::<f32>(i as i32, j as i32)? = array[(i, j)];
        }
    }
    Ok(mat)
}

pub fn matrix3_to_mat(matrix: &Matrix3<f64>) -> opencv::Result<Mat> {
    let mut mat = Mat::zeros_nd(&[3, 3], CV_64F)?.to_mat()?;
    for i in 0..3 {
        for j in 0..3 {
            *mat.at_2d_mut::<f64>(i as i32, j as i32)? = matrix[(i, j)];
        }
    }
    Ok(mat)
}

pub fn mat_to_matrix3(mat: &Mat) -> opencv::Result<Matrix3<f64>> {
    assert!(mat.rows() == 3 && mat.cols() == 3);
    let mut matrix = Matrix3::<f64>::zeros();
    for i in 0..3 {
        for j in 0..3 {
            matrix[(i, j)] = *mat.at_2d::<f64>(i as i32, j as i32)?;
        }
    }
    Ok(matrix)
}

pub fn mat_to_vector3(mat: &Mat) -> opencv::Result<Vector3<f64>> {
    assert!(mat.rows() == 3 && mat.cols() == 1);
    let mut vector = Vector3::<f64>::zeros();
    for i in 0..3 {
        vector[i] = *mat.at_2d::<f64>(i as i32, 0)?;
    }
    Ok(vector)
}
