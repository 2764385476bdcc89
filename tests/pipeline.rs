use std::f64::consts::TAU;
use std::path::Path;
use std::process::Command;

use tempfile::tempdir;
use wavconvolve::{
    convolve, wav, AudioError, ConvolutionConfig, ConvolutionMethod, Sample, Signal, SAMPLE_RATE,
};

const RATE: usize = SAMPLE_RATE as usize;

fn tone(len: usize, frequency: Sample, amplitude: Sample) -> Vec<Sample> {
    (0..len)
        .map(|i| amplitude * (TAU * frequency * i as Sample / SAMPLE_RATE as Sample).sin())
        .collect()
}

fn sparse_ir(len: usize, taps: &[(usize, Sample)]) -> Vec<Sample> {
    let mut ir = vec![0.0; len];
    for &(index, gain) in taps {
        ir[index] = gain;
    }
    ir
}

fn read_with_hound(path: &Path) -> (hound::WavSpec, Vec<i16>) {
    let mut reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>().unwrap();
    (spec, samples)
}

#[test]
fn convolved_output_is_a_standard_wav() {
    let dir = tempdir().unwrap();
    let dry_path = dir.path().join("dry.wav");
    let ir_path = dir.path().join("ir.wav");
    let wet_path = dir.path().join("wet.wav");

    wav::encode(&tone(RATE, 440.0, 0.5), 1, &dry_path).unwrap();
    wav::encode(&sparse_ir(RATE, &[(0, 1.0), (100, 0.5)]), 1, &ir_path).unwrap();

    let dry = wav::read_signal(&dry_path).unwrap();
    let ir = wav::read_signal(&ir_path).unwrap();
    assert_eq!(dry.len(), RATE);
    assert_eq!(ir.len(), RATE);

    let wet = convolve::apply_ir(&dry, &ir).unwrap();
    assert_eq!(wet.len(), 2 * RATE - 1);
    wav::write_signal(&wet, &wet_path).unwrap();

    let (spec, samples) = read_with_hound(&wet_path);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(samples.len(), 2 * RATE - 1);
    assert!(samples.iter().any(|&s| s.unsigned_abs() >= 32767));
}

#[test]
fn every_method_writes_the_same_file() {
    let dir = tempdir().unwrap();
    let dry = Signal::mono(tone(4410, 220.0, 12000.0));
    let ir = Signal::mono(sparse_ir(5000, &[(0, 30000.0), (50, -15000.0), (4000, 8000.0)]));

    let mut outputs = Vec::new();
    for (name, method) in [
        ("direct", ConvolutionMethod::Direct),
        ("fft", ConvolutionMethod::Fft),
        ("iterative", ConvolutionMethod::IterativeFft),
    ] {
        let config = ConvolutionConfig {
            method,
            normalize: true,
        };
        let path = dir.path().join(format!("{name}.wav"));
        let wet = convolve::convolve(&dry, &ir, &config).unwrap();
        wav::write_signal(&wet, &path).unwrap();
        outputs.push(read_with_hound(&path).1);
    }

    for other in &outputs[1..] {
        assert_eq!(other.len(), outputs[0].len());
        for (a, b) in outputs[0].iter().zip(other) {
            assert!((i32::from(*a) - i32::from(*b)).abs() <= 1);
        }
    }
}

#[test]
fn unit_impulse_reproduces_the_dry_signal() {
    let dir = tempdir().unwrap();
    let dry_path = dir.path().join("dry.wav");
    let ir_path = dir.path().join("impulse.wav");
    let wet_path = dir.path().join("wet.wav");

    wav::encode(&tone(RATE, 440.0, 0.5), 1, &dry_path).unwrap();
    wav::encode(&sparse_ir(RATE, &[(0, 1.0)]), 1, &ir_path).unwrap();

    let dry = wav::read_signal(&dry_path).unwrap();
    let ir = wav::read_signal(&ir_path).unwrap();
    let wet = convolve::apply_ir(&dry, &ir).unwrap();
    wav::write_signal(&wet, &wet_path).unwrap();

    let dry_peak = wavconvolve::calculate_peak(dry.samples());
    let (_, samples) = read_with_hound(&wet_path);
    for (i, &dry_sample) in dry.samples().iter().enumerate() {
        let expected = dry_sample / dry_peak * 32768.0;
        assert!((Sample::from(samples[i]) - expected).abs() <= 1.0 + 1e-6);
    }
    assert!(samples[RATE..].iter().all(|&s| s == 0));
}

#[test]
fn decoding_counts_whole_seconds_of_the_riff_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("almost_two_seconds.wav");
    wav::encode(&vec![0.1; 2 * RATE - 1], 1, &path).unwrap();

    // (36 + 2 * 88199) / 2 = 88217 -> two whole seconds, one sample more than stored
    assert_eq!(wav::decode_header(&path).unwrap(), (1, 2 * RATE));
    assert!(matches!(
        wav::read_signal(&path),
        Err(AudioError::TruncatedRead {
            expected: 176400,
            actual: 176398,
            ..
        })
    ));
}

#[test]
fn decodes_a_file_written_by_hound() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hound.wav");
    let written: Vec<i16> = (0..RATE + 100)
        .map(|i| ((i * 7919) % 65536) as i32 - 32768)
        .map(|s| s as i16)
        .collect();

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &sample in &written {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();

    // (36 + 2 * 44200) / 2 = 44218 -> one whole second
    assert_eq!(wav::decode_header(&path).unwrap(), (1, RATE));

    let signal = wav::read_signal(&path).unwrap();
    assert_eq!(signal.channels(), 1);
    assert_eq!(signal.sample_rate(), SAMPLE_RATE);
    assert_eq!(signal.len(), RATE);
    for (&decoded, &original) in signal.samples().iter().zip(&written) {
        assert_eq!(decoded, Sample::from(original));
    }
    assert!(signal.samples().contains(&-32768.0));
}

#[test]
fn missing_input_is_reported() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.wav");
    match wav::read_signal(&missing) {
        Err(err @ AudioError::FileNotFound { .. }) => {
            assert!(err.to_string().contains("nope.wav"));
        }
        other => panic!("expected FileNotFound, got {other:?}"),
    }
}

#[test]
fn cli_convolves_files() {
    let dir = tempdir().unwrap();
    let dry_path = dir.path().join("dry.wav");
    let ir_path = dir.path().join("ir.wav");
    let wet_path = dir.path().join("wet.wav");
    wav::encode(&tone(RATE, 330.0, 0.8), 1, &dry_path).unwrap();
    wav::encode(&sparse_ir(RATE, &[(0, 1.0), (2000, 0.3)]), 1, &ir_path).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_wavconvolve"))
        .args([&dry_path, &ir_path, &wet_path])
        .args(["--method", "iterative-fft"])
        .status()
        .unwrap();
    assert!(status.success());

    let (spec, samples) = read_with_hound(&wet_path);
    assert_eq!(spec.channels, 1);
    assert_eq!(samples.len(), 2 * RATE - 1);
}

#[test]
fn cli_fails_on_missing_input() {
    let dir = tempdir().unwrap();
    let ir_path = dir.path().join("ir.wav");
    let wet_path = dir.path().join("wet.wav");
    wav::encode(&sparse_ir(RATE, &[(0, 1.0)]), 1, &ir_path).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_wavconvolve"))
        .arg(dir.path().join("missing.wav"))
        .args([&ir_path, &wet_path])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.wav"));
    assert!(!wet_path.exists());
}
