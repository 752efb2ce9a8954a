//! Build script for linbench
//!
//! Compiles the batched CUDA kernels to PTX when the cuda feature is
//! enabled. Requires the CUDA Toolkit (nvcc); set `CUDA_PATH` if nvcc is
//! not on PATH.

fn main() {
    #[cfg(feature = "cuda")]
    compile_cuda_kernels();
}

#[cfg(feature = "cuda")]
fn compile_cuda_kernels() {
    use std::env;
    use std::path::PathBuf;
    use std::process::Command;

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let kernels_dir = PathBuf::from("src/backend/cuda/kernels");

    let kernel_files = ["batched_geqrf.cu", "batched_gesvdj.cu", "batched_syevj.cu"];

    let nvcc = find_nvcc().unwrap_or_else(|| {
        panic!(
            "nvcc not found - the CUDA Toolkit must be installed for the 'cuda' feature. \
             Add nvcc to PATH or set CUDA_PATH."
        );
    });

    for kernel_file in kernel_files {
        let cu_path = kernels_dir.join(kernel_file);
        let ptx_path = out_dir.join(kernel_file.replace(".cu", ".ptx"));

        println!("cargo:rerun-if-changed={}", cu_path.display());

        if !cu_path.exists() {
            panic!("CUDA kernel source not found: {}", cu_path.display());
        }

        // sm_75 (Turing) keeps compatibility back to CUDA 10 while allowing
        // modern features
        let output = Command::new(&nvcc)
            .args([
                "-ptx",
                "-O3",
                "-arch=sm_75",
                "-o",
                ptx_path.to_str().unwrap(),
                cu_path.to_str().unwrap(),
            ])
            .output()
            .unwrap_or_else(|e| panic!("failed to execute nvcc ({nvcc}): {e}"));

        if !output.status.success() {
            eprintln!("{}", String::from_utf8_lossy(&output.stdout));
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            panic!("nvcc compilation failed for {kernel_file}");
        }
    }

    // Export the PTX directory for the loader
    println!("cargo:rustc-env=CUDA_KERNEL_DIR={}", out_dir.display());
}

#[cfg(feature = "cuda")]
fn find_nvcc() -> Option<String> {
    use std::env;
    use std::path::PathBuf;
    use std::process::Command;

    if let Ok(cuda_path) = env::var("CUDA_PATH") {
        let nvcc = PathBuf::from(&cuda_path).join("bin").join("nvcc");
        if nvcc.exists() {
            return Some(nvcc.to_string_lossy().to_string());
        }
    }

    if Command::new("nvcc").arg("--version").output().is_ok() {
        return Some("nvcc".to_string());
    }

    for candidate in ["/usr/local/cuda/bin/nvcc", "/opt/cuda/bin/nvcc"] {
        if PathBuf::from(candidate).exists() {
            return Some(candidate.to_string());
        }
    }

    None
}
