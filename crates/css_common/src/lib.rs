//! Common definitions shared across the CSS code toolchain.
//!
//! This crate provides the instruction set that circuit builders emit and
//! simulators, error-model extractors and serializers consume. Keeping the
//! instruction encoding in its own crate lets the core library, the I/O
//! layer and the host tools agree on one representation without depending
//! on each other.

/// Instruction Set Architecture definitions for stabilizer circuits.
///
/// Defines the operations a memory-experiment circuit is made of: resets,
/// Clifford gates, measurements, noise channels and the annotations that turn
/// raw measurement results into detectors and logical observables. The
/// vocabulary mirrors the Stim circuit language so circuits can be exported
/// verbatim.
pub mod isa {
    use core::fmt;

    /// Opcode enumeration for stabilizer circuit instructions.
    ///
    /// Each opcode is one of four kinds: a unitary or reset acting on qubit
    /// targets, a measurement that appends bits to the measurement record, a
    /// noise channel parameterized by a probability, or an annotation that
    /// references earlier measurement results.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Opcode {
        /// Attach a 2D coordinate to a qubit.
        ///
        /// Purely descriptive; simulators ignore it. Arguments are the (x, y)
        /// position and the single target is the qubit index.
        QubitCoords,

        /// Reset each target qubit to |0⟩.
        Reset,

        /// Apply a Hadamard gate to each target qubit.
        ///
        /// Swaps the X and Z eigenbases, used to rotate X-type ancillas and
        /// data qubits of dual-basis experiments into the computational basis.
        H,

        /// Apply CNOT gates to consecutive (control, target) pairs.
        Cx,

        /// Measure each target qubit in the Z basis.
        ///
        /// Appends one bit per target to the measurement record, in target
        /// order.
        Measure,

        /// Measure each target in the Z basis, then reset it to |0⟩.
        MeasureReset,

        /// Apply an X flip to each target independently with probability p.
        XError,

        /// Apply a Z flip to each target independently with probability p.
        ZError,

        /// Apply a uniformly random non-identity Pauli to each target with
        /// probability p.
        Depolarize1,

        /// Layer separator. Marks the start of a syndrome-extraction round.
        Tick,

        /// Declare a detector: the parity of the referenced measurement bits.
        ///
        /// Arguments are the (x, y, t) coordinate relative to the accumulated
        /// coordinate shift. The parity must be deterministic in the absence
        /// of noise.
        Detector,

        /// Fold the referenced measurement bits into a logical observable.
        ///
        /// The single argument is the observable index.
        ObservableInclude,

        /// Shift the coordinate origin of subsequent detectors.
        ///
        /// Emitted at every round boundary with a unit time shift.
        ShiftCoords,
    }

    impl Opcode {
        /// Canonical instruction name in the Stim circuit language.
        pub fn name(self) -> &'static str {
            match self {
                Opcode::QubitCoords => "QUBIT_COORDS",
                Opcode::Reset => "R",
                Opcode::H => "H",
                Opcode::Cx => "CX",
                Opcode::Measure => "M",
                Opcode::MeasureReset => "MR",
                Opcode::XError => "X_ERROR",
                Opcode::ZError => "Z_ERROR",
                Opcode::Depolarize1 => "DEPOLARIZE1",
                Opcode::Tick => "TICK",
                Opcode::Detector => "DETECTOR",
                Opcode::ObservableInclude => "OBSERVABLE_INCLUDE",
                Opcode::ShiftCoords => "SHIFT_COORDS",
            }
        }

        /// Returns true for instructions that append to the measurement record.
        pub fn is_measurement(self) -> bool {
            matches!(self, Opcode::Measure | Opcode::MeasureReset)
        }

        /// Returns true for stochastic noise channels.
        pub fn is_noise(self) -> bool {
            matches!(self, Opcode::XError | Opcode::ZError | Opcode::Depolarize1)
        }

        /// Returns true for instructions whose targets are measurement records.
        pub fn uses_records(self) -> bool {
            matches!(self, Opcode::Detector | Opcode::ObservableInclude)
        }
    }

    impl fmt::Display for Opcode {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }

    /// Operand of an instruction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Target {
        /// A qubit index.
        Qubit(u32),

        /// A measurement record lookback.
        ///
        /// Always negative: `Rec(-1)` is the most recent measurement at the
        /// point the instruction appears in the circuit. Absolute record
        /// indices never appear in an instruction stream.
        Rec(i32),
    }

    impl Target {
        /// Returns the qubit index if this target is a qubit.
        pub fn qubit(self) -> Option<u32> {
            match self {
                Target::Qubit(q) => Some(q),
                Target::Rec(_) => None,
            }
        }

        /// Returns the lookback if this target is a record reference.
        pub fn lookback(self) -> Option<i32> {
            match self {
                Target::Rec(r) => Some(r),
                Target::Qubit(_) => None,
            }
        }
    }

    impl fmt::Display for Target {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Target::Qubit(q) => write!(f, "{}", q),
                Target::Rec(r) => write!(f, "rec[{}]", r),
            }
        }
    }

    /// A single circuit instruction.
    ///
    /// Pairs an opcode with its targets and floating-point arguments
    /// (coordinates, probabilities or observable indices depending on the
    /// opcode).
    #[derive(Debug, Clone, PartialEq)]
    pub struct Instruction {
        /// Operation to perform.
        pub opcode: Opcode,

        /// Qubit or record operands, in application order.
        pub targets: Vec<Target>,

        /// Parenthesized arguments of the instruction.
        pub args: Vec<f64>,
    }

    impl Instruction {
        /// Constructs a new instruction with the specified opcode, targets
        /// and arguments.
        ///
        /// # Arguments
        ///
        /// * `opcode` - The operation to perform
        /// * `targets` - Qubit or record operands
        /// * `args` - Coordinates, probability or observable index
        pub fn new(opcode: Opcode, targets: Vec<Target>, args: Vec<f64>) -> Self {
            Self {
                opcode,
                targets,
                args,
            }
        }

        /// Iterates over the qubit targets of this instruction.
        pub fn qubits(&self) -> impl Iterator<Item = u32> + '_ {
            self.targets.iter().filter_map(|t| t.qubit())
        }

        /// Iterates over the record lookbacks of this instruction.
        pub fn lookbacks(&self) -> impl Iterator<Item = i32> + '_ {
            self.targets.iter().filter_map(|t| t.lookback())
        }
    }

}
